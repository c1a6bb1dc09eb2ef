pub mod metadata;
pub mod operations;

pub use metadata::*;
pub use operations::*;
