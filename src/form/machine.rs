use std::mem;

use tracing::debug;

use super::clean::{canonical_gender, extract_gender};
use super::classify::LineFacts;
use super::document::{FieldValue, KeyRegistry};
use super::matcher::LineMatch;
use super::parser::FormParser;

/// One effect of a processed line, folded into the document by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// A key was minted; records whether its label carried the mandatory marker.
    Mint { key: String, mandatory: bool },
    Value { key: String, value: FieldValue },
}

#[derive(Debug, Default)]
pub struct StepOutcome {
    pub emissions: Vec<Emission>,
    /// The following line was used as this line's value and must be skipped.
    pub consumed_next: bool,
    pub review: Option<&'static str>,
}

#[derive(Debug, Default, Clone)]
pub struct ParserState {
    pub current_section: Option<String>,
    pub current_subgroup: Option<String>,
    /// Most recently opened field awaiting a value or narrative continuation.
    pub last_key: Option<String>,
    pub in_narrative: bool,
    pub narrative_buffer: String,
    pub just_saw_checkbox_block: bool,
}

const AMBIGUOUS_COLON_LINE: &str =
    "colon-terminated line opened a subgroup while a narrative field was open";

/// Line-by-line state machine for one extraction run.
pub struct LineMachine<'a> {
    parser: &'a FormParser,
    state: ParserState,
    keys: KeyRegistry,
}

impl<'a> LineMachine<'a> {
    pub fn new(parser: &'a FormParser) -> Self {
        Self {
            parser,
            state: ParserState::default(),
            keys: KeyRegistry::default(),
        }
    }

    pub fn step(&mut self, raw: &str, next: Option<&str>) -> StepOutcome {
        let mut out = StepOutcome::default();
        let line = raw.trim();
        if line.is_empty() {
            return out;
        }

        let facts = self.parser.line_facts(line, next);

        if let Some(section) = facts
            .numbered_section
            .clone()
            .or_else(|| facts.strong_heading.clone())
        {
            self.flush_narrative(&mut out.emissions);
            debug!(section = %section, "section detected");
            self.state.current_section = Some(section);
            self.state.current_subgroup = None;
            self.state.in_narrative = false;
            self.state.last_key = None;
            self.state.just_saw_checkbox_block = false;
            return out;
        }

        if facts.table_boundary {
            self.flush_narrative(&mut out.emissions);
            self.state.in_narrative = false;
            self.state.last_key = None;
            self.state.just_saw_checkbox_block = false;
        }

        if let Some(subgroup) = facts.subgroup.clone() {
            if self.state.in_narrative && self.state.last_key.is_some() {
                out.review = Some(AMBIGUOUS_COLON_LINE);
            }
            debug!(subgroup = %subgroup, "subgroup detected");
            self.state.current_subgroup = Some(subgroup);
            return out;
        }

        if self.state.just_saw_checkbox_block
            && !facts.grouping
            && !facts.label_or_header
            && !facts.has_glyph
            && self
                .parser
                .is_clinical_section(self.state.current_section.as_deref())
        {
            let key = self.key_for(&self.parser.rules.narrative_label);
            debug!(key = %key, "narrative after reporter checkboxes");
            out.emissions.push(Emission::Value {
                key,
                value: FieldValue::text(self.parser.clean_value(line)),
            });
            self.state.just_saw_checkbox_block = false;
            self.state.last_key = None;
            return out;
        }

        if self.state.in_narrative && self.state.last_key.is_some() {
            self.continue_narrative(line, &facts, &mut out.emissions);
            return out;
        }

        if facts.grouping {
            debug!(line = %line, "skipping grouping/instructional line");
            return out;
        }

        let matches = self.parser.match_line(line);
        if !matches.is_empty() {
            self.emit_matches(matches, &mut out.emissions);
            return out;
        }

        if line.ends_with(':') && line.chars().count() > 3 {
            self.flush_narrative(&mut out.emissions);
            self.open_narrative(&line.replace(':', ""), &mut out.emissions);
            return out;
        }

        if facts.table_boundary {
            let usable_next = next.map(str::trim).filter(|next| {
                !next.is_empty()
                    && !self.parser.is_table_boundary(next)
                    && !self.parser.looks_like_grouping_or_instruction(next)
            });
            if let Some(next) = usable_next {
                self.emit_table_pair(line, next, &mut out.emissions);
                out.consumed_next = true;
                return out;
            }
        }

        if !facts.label_or_header && !self.state.in_narrative {
            if let Some(last_key) = self.state.last_key.take() {
                self.emit_continuation(line, &last_key, &mut out.emissions);
                self.state.just_saw_checkbox_block = false;
            }
        }

        out
    }

    /// Flushes whatever narrative is still open at the end of input.
    pub fn finish(&mut self) -> Vec<Emission> {
        let mut emissions = Vec::new();
        self.flush_narrative(&mut emissions);
        self.state.in_narrative = false;
        self.state.last_key = None;
        emissions
    }

    fn continue_narrative(&mut self, line: &str, facts: &LineFacts, out: &mut Vec<Emission>) {
        let parser = self.parser;
        if facts.grouping {
            self.flush_narrative(out);
            self.state.in_narrative = false;
            self.state.last_key = None;
            debug!(line = %line, "narrative ended by grouping line");
            return;
        }

        let breaks_narrative = parser
            .rules
            .narrative_break_markers
            .iter()
            .any(|marker| line.contains(marker.as_str()));
        if (line.ends_with(':') && line.chars().count() > 1) || breaks_narrative {
            self.flush_narrative(out);
            self.open_narrative(&line.replace(':', ""), out);
            return;
        }

        if let Some(captures) = parser.patterns.label_value_line.captures(line) {
            self.flush_narrative(out);
            let (label, mandatory) = parser.normalize_label(captures[1].trim());
            let (key, value) = self.labelled_value(&label, &captures[2]);
            out.push(Emission::Mint {
                key: key.clone(),
                mandatory,
            });
            if parser.is_valid_value(&value, &key) {
                debug!(key = %key, value = %value, "label:value inside narrative");
                out.push(Emission::Value {
                    key: key.clone(),
                    value,
                });
            }
            self.state.last_key = Some(key);
            self.state.in_narrative = false;
            return;
        }

        if !self.state.narrative_buffer.is_empty() {
            self.state.narrative_buffer.push(' ');
        }
        self.state.narrative_buffer.push_str(line);
    }

    fn open_narrative(&mut self, raw_label: &str, out: &mut Vec<Emission>) {
        let (label, mandatory) = self.parser.normalize_label(raw_label.trim());
        let base = self.key_for(&label);
        let unique = self.keys.make_unique(&base);
        let key = self.parser.gender_key(&base).unwrap_or(unique);

        debug!(key = %key, mandatory, "narrative start");
        out.push(Emission::Mint {
            key: key.clone(),
            mandatory,
        });
        self.state.last_key = Some(key);
        self.state.in_narrative = true;
    }

    fn emit_matches(&mut self, matches: Vec<LineMatch>, out: &mut Vec<Emission>) {
        let mut all_checkbox = true;
        let mut saw_reporter_box = false;

        for found in matches {
            if found.is_checkbox() {
                let is_reporter = self
                    .parser
                    .rules
                    .reporter_checkbox_labels
                    .iter()
                    .any(|label| label.eq_ignore_ascii_case(found.label().trim()));
                if is_reporter {
                    saw_reporter_box = true;
                } else {
                    all_checkbox = false;
                }
            } else {
                all_checkbox = false;
            }

            match found {
                LineMatch::LabelBox { label, checked } | LineMatch::BoxLabel { label, checked } => {
                    let (label, mandatory) = self.parser.normalize_label(&label);
                    let key = self.mint(&label, mandatory, out);
                    debug!(key = %key, checked, "checkbox detected");
                    out.push(Emission::Value {
                        key: key.clone(),
                        value: FieldValue::Bool(checked),
                    });
                    self.state.last_key = Some(key);
                }
                LineMatch::LabelValue { label, value } => {
                    self.emit_label_value(&label, &value, out);
                }
            }
        }

        self.state.just_saw_checkbox_block = all_checkbox
            && saw_reporter_box
            && self
                .parser
                .is_clinical_section(self.state.current_section.as_deref());
    }

    fn emit_label_value(&mut self, raw_label: &str, raw_value: &str, out: &mut Vec<Emission>) {
        if self.parser.looks_like_grouping_or_instruction(raw_label)
            || self.parser.looks_like_grouping_or_instruction(raw_value)
        {
            debug!(label = %raw_label, value = %raw_value, "skipping label:value with heading side");
            return;
        }

        let (label, mandatory) = self.parser.normalize_label(raw_label.trim());
        let cleaned = self.parser.clean_value(raw_value);

        if let Some((head, tail)) = self.split_trailing_heading(&cleaned) {
            let key = self.mint(&label, mandatory, out);
            let value = self.parser.strip_trailing_grouping(&head);
            debug!(key = %key, value = %value, heading = %tail, "label:value with trailing heading");
            out.push(Emission::Value {
                key,
                value: FieldValue::text(value),
            });
            let (heading_label, heading_mandatory) = self.parser.normalize_label(&tail);
            let heading_key = self.mint(&heading_label, heading_mandatory, out);
            self.state.last_key = Some(heading_key);
            self.state.in_narrative = true;
            return;
        }

        let (key, value) = self.labelled_value(&label, raw_value);
        out.push(Emission::Mint {
            key: key.clone(),
            mandatory,
        });
        if self.parser.is_valid_value(&value, &key) {
            debug!(key = %key, value = %value, "label:value detected");
            out.push(Emission::Value {
                key: key.clone(),
                value,
            });
            self.state.last_key = Some(key);
        }
    }

    /// Mints the key for a labelled value and parses the value, rewriting the
    /// sex shorthand key to the gender key.
    fn labelled_value(&mut self, label: &str, raw_value: &str) -> (String, FieldValue) {
        let base = self.key_for(label);
        let key = self.keys.make_unique(&base);

        if let Some(gender_key) = self.parser.gender_key(&base) {
            let value = self.gender_value(raw_value);
            debug!(key = %gender_key, value = %value, "gender key normalized");
            return (gender_key, FieldValue::text(value));
        }

        let cleaned = self.parser.clean_value(raw_value);
        let value = match self.parser.parse_value(&cleaned, label) {
            FieldValue::Text(text) => FieldValue::text(self.parser.strip_trailing_grouping(&text)),
            other => other,
        };
        (key, value)
    }

    /// A value followed by a capitalized `Heading/...` fragment that is itself a grouping line.
    fn split_trailing_heading(&self, value: &str) -> Option<(String, String)> {
        let found = self.parser.patterns.trailing_heading.find(value)?;
        let tail = value[found.start()..].trim();
        if !self.parser.looks_like_grouping_or_instruction(tail) {
            return None;
        }
        Some((value[..found.start()].trim().to_string(), tail.to_string()))
    }

    fn emit_table_pair(&mut self, line: &str, next: &str, out: &mut Vec<Emission>) {
        let wand_label = &self.parser.rules.wand_number_label;
        if line.to_lowercase().contains(&wand_label.to_lowercase()) {
            let key = self.key_for(wand_label);
            debug!(key = %key, value = %next, "wand number row");
            out.push(Emission::Mint {
                key: key.clone(),
                mandatory: false,
            });
            out.push(Emission::Value {
                key,
                value: FieldValue::text(self.parser.clean_value(next)),
            });
            return;
        }

        let (label, mandatory) = self.parser.normalize_label(line);
        let key = self.mint(&label, mandatory, out);
        let value = self
            .parser
            .parse_value(&self.parser.clean_value(next), &label);
        debug!(key = %key, value = %value, "table row pair");
        out.push(Emission::Value { key, value });
    }

    /// A bare line following an opened field is that field's single-line value.
    fn emit_continuation(&mut self, line: &str, last_key: &str, out: &mut Vec<Emission>) {
        let value = if self.parser.gender_key(last_key).is_some() || self.parser.is_gender_key(last_key)
        {
            FieldValue::text(self.gender_value(line))
        } else {
            self.parser
                .parse_value(&self.parser.clean_value(line), last_key)
        };

        if !self.parser.is_valid_value(&value, last_key) {
            return;
        }

        match self.narrative_redirect(last_key) {
            Some(narrative_key) => {
                debug!(key = %narrative_key, checkbox = %last_key, "checkbox text redirected to narrative");
                out.push(Emission::Value {
                    key: narrative_key,
                    value,
                });
            }
            None => {
                debug!(key = %last_key, value = %value, "single-line value");
                out.push(Emission::Value {
                    key: last_key.to_string(),
                    value,
                });
            }
        }
    }

    /// Free text after the clinical section's N/A checkbox belongs to its narrative.
    fn narrative_redirect(&self, key: &str) -> Option<String> {
        if !self
            .parser
            .is_clinical_section(self.state.current_section.as_deref())
        {
            return None;
        }
        let rules = &self.parser.rules;
        let suffix = format!("_{}", self.parser.to_pascal_tokens(&rules.narrative_redirect_label));
        key.strip_suffix(suffix.as_str()).map(|stem| {
            format!("{stem}_{}", self.parser.to_pascal_tokens(&rules.narrative_label))
        })
    }

    fn flush_narrative(&mut self, out: &mut Vec<Emission>) {
        let buffer = mem::take(&mut self.state.narrative_buffer);
        if !self.state.in_narrative || buffer.is_empty() {
            return;
        }
        let Some(key) = self.state.last_key.clone() else {
            return;
        };
        if !self
            .parser
            .is_valid_value(&FieldValue::text(buffer.as_str()), &key)
        {
            debug!(key = %key, "discarding invalid narrative");
            return;
        }

        let narrative = if self.parser.is_gender_key(&key) {
            self.gender_value(&buffer)
        } else {
            self.parser.clean_value(&buffer)
        };

        if let Some(captures) = self.parser.patterns.trailing_number.captures(&narrative) {
            let main_text = captures[1].trim().to_string();
            let wand_key = self.key_for(&self.parser.rules.wand_number_label);
            debug!(key = %key, wand_key = %wand_key, "narrative with trailing number");
            out.push(Emission::Value {
                key,
                value: FieldValue::text(main_text),
            });
            out.push(Emission::Value {
                key: wand_key,
                value: FieldValue::text(&captures[2]),
            });
            return;
        }

        debug!(key = %key, "flushing narrative");
        out.push(Emission::Value {
            key,
            value: FieldValue::text(narrative),
        });
    }

    fn gender_value(&self, raw: &str) -> String {
        match canonical_gender(raw) {
            Some(gender) => gender.to_string(),
            None => extract_gender(&self.parser.clean_value(raw)),
        }
    }

    fn key_for(&self, label: &str) -> String {
        self.parser.build_key(&[
            self.state.current_section.as_deref(),
            self.state.current_subgroup.as_deref(),
            Some(label),
        ])
    }

    fn mint(&mut self, label: &str, mandatory: bool, out: &mut Vec<Emission>) -> String {
        let base = self.key_for(label);
        let key = self.keys.make_unique(&base);
        out.push(Emission::Mint {
            key: key.clone(),
            mandatory,
        });
        key
    }
}
