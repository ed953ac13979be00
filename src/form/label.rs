use super::parser::FormParser;

/// Labels are assumed short and to sit at the end of noisy fragments.
const MAX_LABEL_TOKENS: usize = 3;

impl FormParser {
    /// Returns the canonical label and whether it carried the `*` mandatory marker.
    pub fn normalize_label(&self, raw: &str) -> (String, bool) {
        let mandatory = raw.contains('*');
        let unmarked = raw.replace('*', "");
        let head = self.strip_label_head(&unmarked);

        let mut tokens = self.label_tokens(&head);
        if tokens.len() > MAX_LABEL_TOKENS {
            tokens.drain(..tokens.len() - MAX_LABEL_TOKENS);
        }

        let joined = self.strip_label_head(&tokens.join(" "));
        let label = self.label_tokens(&joined).join(" ");

        if label.eq_ignore_ascii_case(&self.rules.gender_shorthand) {
            return (self.rules.gender_label.clone(), mandatory);
        }

        (label, mandatory)
    }

    fn label_tokens<'a>(&self, label: &'a str) -> Vec<&'a str> {
        self.patterns
            .label_separator
            .split(label.trim())
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Drops leading punctuation and instruction verbs until neither remains.
    fn strip_label_head(&self, label: &str) -> String {
        let mut current = label.trim().to_string();

        loop {
            let stripped = self
                .patterns
                .leading_non_alphanumeric
                .replace(&current, "")
                .trim()
                .to_string();

            let lower = stripped.to_ascii_lowercase();
            let verb = self.rules.instruction_verbs.iter().find(|verb| {
                lower.starts_with(verb.as_str())
                    && lower[verb.len()..]
                        .chars()
                        .next()
                        .is_none_or(|ch| !ch.is_alphanumeric())
            });

            let next = match verb {
                Some(verb) => stripped[verb.len()..].trim().to_string(),
                None => stripped,
            };

            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Section and subgroup titles: numbers removed, cut before trailing instructions.
    pub fn normalize_section_name(&self, raw: &str) -> String {
        let without_numbers = self.patterns.standalone_number.replace_all(raw, "");
        let mut name = self
            .patterns
            .repeated_whitespace
            .replace_all(&without_numbers, " ")
            .trim()
            .to_string();

        for splitter in &self.rules.section_splitters {
            if let Some(index) = name.to_ascii_lowercase().find(splitter.as_str()) {
                if index > 0 {
                    name = name[..index].trim().to_string();
                }
            }
        }

        name
    }
}
