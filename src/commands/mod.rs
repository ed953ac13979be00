pub mod classify;
pub mod extract;
mod source;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::form::{FormParser, FormRules};

fn build_parser(rules_path: Option<&Path>) -> Result<FormParser> {
    let rules = match rules_path {
        Some(path) => {
            info!(path = %path.display(), "loading form rules");
            FormRules::from_path(path)?
        }
        None => FormRules::default(),
    };
    FormParser::new(rules)
}
