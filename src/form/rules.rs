use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::read_json;

/// Keyword tables driving the line heuristics. New form layouts are supported by
/// extending these tables rather than the state machine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormRules {
    pub key_prefix: String,
    pub checked_glyphs: Vec<char>,
    pub unchecked_glyphs: Vec<char>,
    pub strong_headings: Vec<String>,
    pub table_boundaries: Vec<String>,
    pub section_splitters: Vec<String>,
    pub instruction_verbs: Vec<String>,
    pub grouping_nouns: Vec<String>,
    pub trailing_grouping_nouns: Vec<String>,
    pub instruction_contains: Vec<String>,
    pub instruction_prefixes: Vec<String>,
    pub invalid_exact: Vec<String>,
    pub invalid_prefixes: Vec<String>,
    pub invalid_contains: Vec<String>,
    pub invalid_patterns: Vec<String>,
    pub invalid_key_suffixes: Vec<String>,
    pub short_valid_tokens: Vec<String>,
    pub clinical_section: String,
    pub reporter_checkbox_labels: Vec<String>,
    pub narrative_redirect_label: String,
    pub narrative_label: String,
    pub narrative_break_markers: Vec<String>,
    pub wand_number_label: String,
    pub gender_label: String,
    pub gender_shorthand: String,
}

impl FormRules {
    pub fn from_path(path: &Path) -> Result<Self> {
        read_json(path).with_context(|| format!("invalid rules file {}", path.display()))
    }

    pub fn is_glyph(&self, ch: char) -> bool {
        self.checked_glyphs.contains(&ch) || self.unchecked_glyphs.contains(&ch)
    }

    pub fn is_checked(&self, glyph: char) -> bool {
        self.checked_glyphs.contains(&glyph)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            key_prefix: "NZ".to_string(),
            checked_glyphs: vec!['☒', '☑'],
            unchecked_glyphs: vec!['☐'],
            strong_headings: strings(&[
                "Remedial Actions/Corrective Action/Preventive Action",
                "Other Reporting Information",
            ]),
            table_boundaries: strings(&[
                "list of other devices involved",
                "if other implants involved",
                "mfr/sponsor aware of other similar events",
                "country where these similar adverse events occurred",
                "additional comments",
            ]),
            section_splitters: strings(&[
                " if ", " indicate", ":", "-", " please", " select", " choose", " tick", " check",
            ]),
            instruction_verbs: strings(&[
                "indicate",
                "select",
                "choose",
                "tick",
                "check",
                "please",
                "provide",
                "enter",
                "describe",
                "for details see",
                "see",
                "if the device",
                "is the device",
                "attach",
            ]),
            grouping_nouns: strings(&[
                "device",
                "patient",
                "event",
                "report",
                "information",
                "details",
                "narrative",
                "summary",
                "category",
                "type",
                "manufacturer",
                "model",
                "serial",
                "lot",
                "catalog",
                "brand",
                "other",
                "comments",
                "notes",
                "example",
                "section",
                "subsection",
                "grouping",
                "header",
                "heading",
                "description",
                "explanation",
            ]),
            trailing_grouping_nouns: strings(&[
                "specific device information",
                "device information",
                "patient information",
                "event information",
                "details",
                "narrative",
                "summary",
                "category",
                "type",
                "manufacturer",
                "model",
                "catalog",
                "other",
                "comments",
                "notes",
                "example",
                "section",
                "subsection",
                "grouping",
                "header",
                "heading",
                "description",
                "explanation",
            ]),
            instruction_contains: strings(&[
                "indicate",
                "see definition",
                "category",
                "grouping",
                "instruction",
                "both implant date and explant dates",
                "resolution of event and outcomes",
                "patient focused",
                "specific device information",
            ]),
            instruction_prefixes: strings(&["for details see", "please", "attach", "if the device"]),
            invalid_exact: strings(&["not applicable", "none", "click here to enter text"]),
            invalid_prefixes: strings(&[
                "please submit",
                "provide as much detail",
                "specify",
                "note:",
                "example:",
                "for example:",
                "email:",
                "if there have been other similar events reported",
                "●",
            ]),
            invalid_contains: strings(&[
                "submit an initial report",
                "submit a final report",
                "see guidance",
                "attach",
                "guidance",
                "send this form to",
                "if none, write",
                "the first report that the reporter",
                "submit this report when the investigation is complete",
                "number should include the number sold",
                "in some cases, the patient’s age",
                "incidence rate",
                "this investigation should include details such as",
                "critical information that should be provided includes",
                "report types",
                "clinical event information",
                "manufacturer’s investigation",
                "harm definitions",
                "where required, to provide an update to a previous report",
                "report category",
                "investigation is not yet complete and the final report not available.",
            ]),
            invalid_patterns: strings(&[r"^\*?age:?$", r"^\*?wt.\(kg\):?$", r"^\*?m/f:?$"]),
            invalid_key_suffixes: strings(&["note", "example"]),
            short_valid_tokens: strings(&["no"]),
            clinical_section: "Description Of The Clinical Event Problem".to_string(),
            reporter_checkbox_labels: strings(&["Hcp", "Other Caregiver", "Patient", "N/A"]),
            narrative_redirect_label: "N/A".to_string(),
            narrative_label: "Narrative".to_string(),
            narrative_break_markers: strings(&[
                "Remedial Actions/Corrective Action/Preventive Action",
            ]),
            wand_number_label: "Wand Number".to_string(),
            gender_label: "Gender".to_string(),
            gender_shorthand: "M/F".to_string(),
        }
    }
}
