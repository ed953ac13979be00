use super::document::FieldValue;
use super::parser::FormParser;

const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

impl FormParser {
    pub fn clean_value(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let without_aside = self.patterns.leading_parenthetical.replace(trimmed, "");
        self.strip_trailing_grouping(&without_aside)
    }

    /// Removes trailing grouping nouns ("details", "summary", ...) until none remain.
    pub fn strip_trailing_grouping(&self, value: &str) -> String {
        let mut current = value.trim().to_string();

        loop {
            let mut next = current.clone();
            for pattern in &self.patterns.trailing_grouping {
                next = pattern.replace(&next, "").trim().to_string();
            }
            if next == current {
                return current;
            }
            current = next;
        }
    }

    pub fn parse_value(&self, value: &str, label: &str) -> FieldValue {
        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") {
            return FieldValue::Bool(true);
        }
        if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") {
            return FieldValue::Bool(false);
        }

        if label.to_lowercase().contains("date") {
            if let Some(captures) = self.patterns.date.captures(value) {
                return FieldValue::text(&captures[1]);
            }
        }

        FieldValue::text(value)
    }
}

pub fn canonical_gender(raw: &str) -> Option<&'static str> {
    let lower = raw.trim().to_lowercase();
    GENDERS
        .into_iter()
        .find(|gender| lower.starts_with(&gender.to_lowercase()))
}

pub fn extract_gender(raw: &str) -> String {
    canonical_gender(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
