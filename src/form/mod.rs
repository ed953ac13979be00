mod classify;
mod clean;
mod document;
mod extract;
mod flatten;
mod form_fields;
mod keys;
mod label;
mod machine;
mod matcher;
mod parser;
mod rules;
#[cfg(test)]
mod tests;
mod validate;

pub use classify::LineClass;
pub use document::{ExtractionDocument, FieldEntry};
pub use extract::ExtractionOutcome;
pub use parser::FormParser;
pub use rules::FormRules;
