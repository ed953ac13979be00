use anyhow::{Context, Result};
use regex::Regex;

use super::rules::FormRules;

/// Characters a field label may be built from.
const LABEL_CHARS: &str = r"A-Za-z0-9_\-/()&\[\].,#*'’ ";

#[derive(Debug)]
pub(super) struct FormPatterns {
    pub numbered_section: Regex,
    pub standalone_number: Regex,
    pub repeated_whitespace: Regex,
    pub parenthetical: Regex,
    pub non_alphanumeric: Regex,
    pub leading_parenthetical: Regex,
    pub leading_non_alphanumeric: Regex,
    pub label_separator: Regex,
    pub pure_grouping: Regex,
    pub punctuation_only: Regex,
    pub invalid_patterns: Vec<Regex>,
    pub trailing_grouping: Vec<Regex>,
    pub date: Regex,
    pub trailing_number: Regex,
    pub label_value_line: Regex,
    pub label_tail: Regex,
    pub trailing_heading: Regex,
}

/// Compiled rule set. Immutable and shareable across extraction runs.
#[derive(Debug)]
pub struct FormParser {
    pub(super) rules: FormRules,
    pub(super) patterns: FormPatterns,
}

impl FormParser {
    pub fn new(rules: FormRules) -> Result<Self> {
        let grouping_alternation = rules
            .grouping_nouns
            .iter()
            .map(|noun| regex::escape(noun))
            .collect::<Vec<_>>()
            .join("|");

        let invalid_patterns = rules
            .invalid_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile invalid-value pattern {pattern}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let trailing_grouping = rules
            .trailing_grouping_nouns
            .iter()
            .map(|noun| {
                Regex::new(&format!(r"(?i)\b{}\b\.?$", regex::escape(noun)))
                    .with_context(|| format!("failed to compile trailing grouping regex for {noun}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let patterns = FormPatterns {
            // `1. Title`, or dotted `3.1 Title` whose title is capitalized (`12.5 mg` is not).
            numbered_section: Regex::new(
                r"^(?:\d+\.\s*([A-Za-z][^-:\n]*)|\d+(?:\.\d+)+\.?\s+([A-Z][^-:\n]*))",
            )
            .context("failed to compile numbered section regex")?,
            standalone_number: Regex::new(r"\b\d+\.?\b")
                .context("failed to compile standalone number regex")?,
            repeated_whitespace: Regex::new(r"\s{2,}")
                .context("failed to compile whitespace regex")?,
            parenthetical: Regex::new(r"\(.*?\)").context("failed to compile parenthetical regex")?,
            non_alphanumeric: Regex::new(r"[^a-zA-Z0-9]")
                .context("failed to compile non-alphanumeric regex")?,
            leading_parenthetical: Regex::new(r"^\([^)]*\)\s*")
                .context("failed to compile leading parenthetical regex")?,
            leading_non_alphanumeric: Regex::new(r"^[^A-Za-z0-9]+")
                .context("failed to compile leading non-alphanumeric regex")?,
            label_separator: Regex::new(r"[\s_]+").context("failed to compile label separator regex")?,
            pure_grouping: Regex::new(&format!(
                r"^(?:specific )?(?:{grouping_alternation})[ .:\-]*$"
            ))
            .context("failed to compile grouping line regex")?,
            punctuation_only: Regex::new(r"^\W*$").context("failed to compile punctuation regex")?,
            invalid_patterns,
            trailing_grouping,
            date: Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").context("failed to compile date regex")?,
            trailing_number: Regex::new(r"^(.*?)\s+(\d+)$")
                .context("failed to compile trailing number regex")?,
            label_value_line: Regex::new(&format!(r"^([{LABEL_CHARS}]+?):\s*(.*)$"))
                .context("failed to compile label:value line regex")?,
            label_tail: Regex::new(&format!(r"[{LABEL_CHARS}]+$"))
                .context("failed to compile label tail regex")?,
            trailing_heading: Regex::new(r"\s([A-Z][a-z]+(?: [A-Z][a-z]+)*/)")
                .context("failed to compile trailing heading regex")?,
        };

        Ok(Self { rules, patterns })
    }
}
