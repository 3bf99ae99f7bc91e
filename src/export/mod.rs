pub mod json;

pub use json::{ExportError, ReviewSnapshot};
