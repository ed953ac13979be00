use super::document::{ExtractionDocument, FieldEntry, MandatoryRegistry};
use super::parser::FormParser;

impl FormParser {
    /// Drops invalid entries and settles each survivor into its final envelope shape.
    pub fn flatten(
        &self,
        document: &ExtractionDocument,
        mandatory: &MandatoryRegistry,
    ) -> ExtractionDocument {
        let mut flattened = ExtractionDocument::new();

        for (key, entry) in document.iter() {
            if !self.is_valid_value(entry.value(), key) {
                continue;
            }

            let settled = match entry {
                FieldEntry::Envelope {
                    mandatory: true, ..
                } => entry.clone(),
                FieldEntry::Envelope { value, .. } => FieldEntry::Scalar(value.clone()),
                FieldEntry::Scalar(value) => {
                    FieldEntry::wrap(value.clone(), mandatory.is_mandatory(key))
                }
            };
            flattened.insert(key.to_string(), settled);
        }

        flattened
    }
}
