pub mod src {
    pub mod state;
}

pub use src::state::{
    can_reuse_old_state, create, get_all_dependencies, get_files_affected_by,
    update_signatures_from_cache, BuilderStateBase, FileInfo, SignatureCache,
};
