pub mod src {
    pub mod canonical;
}

pub use src::canonical::*;

#[cfg(test)]
mod test;
