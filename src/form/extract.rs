use tracing::warn;

use super::document::{ExtractionDocument, ExtractionSeed, FieldEntry, MandatoryRegistry};
use super::machine::{Emission, LineMachine};
use super::parser::FormParser;
use crate::model::ReviewFlag;

#[derive(Debug)]
pub struct ExtractionOutcome {
    /// Flattened, canonical document.
    pub document: ExtractionDocument,
    /// Entries accumulated before flattening dropped invalid ones.
    pub raw_field_count: usize,
    pub review_flags: Vec<ReviewFlag>,
}

impl FormParser {
    /// One extraction run over already-extracted text lines. All run state is
    /// created here and dropped on return.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S], seed: ExtractionSeed) -> ExtractionOutcome {
        let ExtractionSeed {
            mut document,
            mut mandatory,
        } = seed;
        let mut machine = LineMachine::new(self);
        let mut review_flags = Vec::new();

        let mut index = 0;
        while index < lines.len() {
            let line = lines[index].as_ref();
            let next = lines.get(index + 1).map(AsRef::as_ref);
            let outcome = machine.step(line, next);

            if let Some(reason) = outcome.review {
                warn!(line_number = index + 1, line = %line.trim(), reason, "line flagged for review");
                review_flags.push(ReviewFlag {
                    line_number: index + 1,
                    line: line.trim().to_string(),
                    reason: reason.to_string(),
                });
            }

            apply_emissions(outcome.emissions, &mut document, &mut mandatory);
            index += if outcome.consumed_next { 2 } else { 1 };
        }
        apply_emissions(machine.finish(), &mut document, &mut mandatory);

        ExtractionOutcome {
            raw_field_count: document.len(),
            document: self.flatten(&document, &mandatory),
            review_flags,
        }
    }
}

fn apply_emissions(
    emissions: Vec<Emission>,
    document: &mut ExtractionDocument,
    mandatory: &mut MandatoryRegistry,
) {
    for emission in emissions {
        match emission {
            Emission::Mint {
                key,
                mandatory: flag,
            } => mandatory.record(&key, flag),
            Emission::Value { key, value } => {
                let entry = FieldEntry::wrap(value, mandatory.is_mandatory(&key));
                document.insert(key, entry);
            }
        }
    }
}
