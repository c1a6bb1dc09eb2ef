pub mod config;
pub mod error;
pub mod labeler;
pub mod model;
pub mod parse;
pub mod reader;
pub mod request;

pub use error::SpecError;
pub use reader::{ApiSpecReader, SpecDialect, create_reader};

/// Read a specification document, choosing the dialect from its content.
pub fn read_spec(text: &str) -> Result<Box<dyn ApiSpecReader>, SpecError> {
    create_reader(SpecDialect::detect(text), text)
}
