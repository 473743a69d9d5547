pub mod src {
    pub mod project;
}

pub use src::project::{
    parse_build_configuration, read_build_configuration, ParsedBuildConfiguration,
};

#[cfg(test)]
mod test;
