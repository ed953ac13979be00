use tracing::debug;

use super::document::{ExtractionSeed, FieldEntry, FieldValue};
use super::parser::FormParser;
use crate::model::{FormFieldKind, FormFieldRecord};

impl FormParser {
    /// Seeds a run with interactive-form widget values. Their keys carry no section.
    pub fn seed_from_form_fields(&self, fields: &[FormFieldRecord]) -> ExtractionSeed {
        let mut seed = ExtractionSeed::default();

        for field in fields {
            let (label, mandatory) = self.normalize_label(&field.name);
            let key = self.build_key(&[Some(label.as_str())]);
            seed.mandatory.record(&key, mandatory);

            match field.kind {
                FormFieldKind::Checkbox => {
                    let checked = field.checked.unwrap_or(false);
                    debug!(key = %key, checked, mandatory, "form checkbox");
                    seed.document
                        .insert(key, FieldEntry::wrap(FieldValue::Bool(checked), mandatory));
                }
                FormFieldKind::Text => {
                    let value =
                        FieldValue::text(self.clean_value(field.value.as_deref().unwrap_or("")));
                    if self.is_valid_value(&value, &key) {
                        debug!(key = %key, value = %value, mandatory, "form text field");
                        seed.document.insert(key, FieldEntry::wrap(value, mandatory));
                    }
                }
            }
        }

        seed
    }
}
