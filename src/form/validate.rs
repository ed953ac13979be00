use super::document::FieldValue;
use super::parser::FormParser;

impl FormParser {
    /// Single gate for every candidate value, applied during line processing and
    /// again while flattening.
    pub fn is_valid_value(&self, value: &FieldValue, key: &str) -> bool {
        if matches!(value, FieldValue::Null) {
            return false;
        }

        let rendered = value.to_string();
        let val = rendered.trim();
        if val.is_empty() {
            return false;
        }

        let lower = val.to_lowercase();
        let rules = &self.rules;
        let patterns = &self.patterns;

        if rules.invalid_exact.iter().any(|phrase| lower == *phrase)
            || (lower.starts_with('(') && lower.ends_with(')'))
            || rules
                .invalid_prefixes
                .iter()
                .any(|prefix| lower.starts_with(prefix.as_str()))
            || rules
                .invalid_contains
                .iter()
                .any(|phrase| lower.contains(phrase.as_str()))
            || patterns.punctuation_only.is_match(&lower)
            || patterns
                .invalid_patterns
                .iter()
                .any(|pattern| pattern.is_match(&lower))
        {
            return false;
        }

        let lower_key = key.to_lowercase();
        if rules
            .invalid_key_suffixes
            .iter()
            .any(|suffix| lower_key.ends_with(suffix.as_str()))
        {
            return false;
        }

        if val.chars().count() < 2
            && !rules
                .short_valid_tokens
                .iter()
                .any(|token| token.eq_ignore_ascii_case(val))
        {
            return false;
        }

        true
    }
}
