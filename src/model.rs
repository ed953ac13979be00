use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    Text,
    Checkbox,
}

/// One interactive form widget, as exported alongside the flattened text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFieldRecord {
    pub name: String,
    pub kind: FormFieldKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewFlag {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub path: String,
    pub sha256: String,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionCounts {
    pub line_count: usize,
    pub seeded_field_count: usize,
    pub raw_field_count: usize,
    pub output_field_count: usize,
    pub mandatory_field_count: usize,
    pub dropped_field_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub source: SourceEntry,
    pub form_fields_path: Option<String>,
    pub rules_path: Option<String>,
    pub output_path: Option<String>,
    pub counts: ExtractionCounts,
    pub review_flags: Vec<ReviewFlag>,
}
