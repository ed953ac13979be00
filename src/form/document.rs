use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A stored document entry: either a bare scalar or a `{value, mandatory}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Scalar(FieldValue),
    Envelope { value: FieldValue, mandatory: bool },
}

impl FieldEntry {
    pub fn wrap(value: FieldValue, mandatory: bool) -> Self {
        if mandatory {
            Self::Envelope {
                value,
                mandatory: true,
            }
        } else {
            Self::Scalar(value)
        }
    }

    pub fn value(&self) -> &FieldValue {
        match self {
            Self::Scalar(value) | Self::Envelope { value, .. } => value,
        }
    }
}

impl fmt::Display for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Envelope { value, mandatory } => {
                write!(f, "{{value={value}, mandatory={mandatory}}}")
            }
        }
    }
}

/// Key-ordered extraction result. Rewriting a key keeps its first-write position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionDocument {
    entries: Vec<(String, FieldEntry)>,
    index: HashMap<String, usize>,
}

impl ExtractionDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, entry: FieldEntry) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = entry,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, entry));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldEntry> {
        self.index
            .get(key)
            .map(|&position| &self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }
}

impl Serialize for ExtractionDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Records whether the label behind each minted key carried the mandatory marker.
#[derive(Debug, Clone, Default)]
pub struct MandatoryRegistry {
    flags: HashMap<String, bool>,
}

impl MandatoryRegistry {
    /// A key once marked mandatory stays mandatory.
    pub fn record(&mut self, key: &str, mandatory: bool) {
        *self.flags.entry(key.to_string()).or_insert(false) |= mandatory;
    }

    pub fn is_mandatory(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }
}

/// Per-run occurrence counter used to keep repeated labels apart.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    counts: HashMap<String, usize>,
}

impl KeyRegistry {
    pub fn make_unique(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{base}_{count}")
        }
    }
}

/// A pre-populated result handed to a run, typically from interactive form widgets.
#[derive(Debug, Clone, Default)]
pub struct ExtractionSeed {
    pub document: ExtractionDocument,
    pub mandatory: MandatoryRegistry,
}
