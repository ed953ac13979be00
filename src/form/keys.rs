use super::parser::FormParser;

impl FormParser {
    /// Joins the Pascal-cased parts under the namespace prefix, skipping empty parts.
    pub fn build_key(&self, parts: &[Option<&str>]) -> String {
        let tokens = parts
            .iter()
            .flatten()
            .map(|part| self.to_pascal_tokens(part))
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>();

        format!("{}_{}", self.rules.key_prefix, tokens.join("_"))
    }

    pub(super) fn to_pascal_tokens(&self, input: &str) -> String {
        let without_asides = self.patterns.parenthetical.replace_all(input, "");
        let spaced = self
            .patterns
            .non_alphanumeric
            .replace_all(&without_asides, " ");

        spaced
            .split_whitespace()
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => {
                        let mut token = first.to_ascii_uppercase().to_string();
                        token.push_str(&chars.as_str().to_ascii_lowercase());
                        token
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Suffix-level rewrite of the sex indicator shorthand to the canonical gender key.
    pub(super) fn gender_key(&self, key: &str) -> Option<String> {
        let shorthand = format!("_{}", self.to_pascal_tokens(&self.rules.gender_shorthand));
        key.strip_suffix(shorthand.as_str()).map(|stem| {
            format!("{stem}_{}", self.to_pascal_tokens(&self.rules.gender_label))
        })
    }

    pub(super) fn is_gender_key(&self, key: &str) -> bool {
        let suffix = format!("_{}", self.to_pascal_tokens(&self.rules.gender_label));
        key.ends_with(suffix.as_str())
    }

    pub(super) fn is_clinical_section(&self, section: Option<&str>) -> bool {
        section.is_some_and(|name| {
            self.to_pascal_tokens(name) == self.to_pascal_tokens(&self.rules.clinical_section)
        })
    }
}
