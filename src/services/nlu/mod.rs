pub mod classifier;
pub mod extractor;
pub mod validator;

pub use classifier::classify;
pub use extractor::{extract, ExtractedFields};
pub use validator::{ValidationError, Validator};
