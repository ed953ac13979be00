use serde::Serialize;

use super::parser::FormParser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", content = "text", rename_all = "snake_case")]
pub enum LineClass {
    Blank,
    NumberedSection(String),
    StrongHeading(String),
    TableBoundary,
    SubgroupOpener(String),
    GroupingOrInstruction,
    Content,
}

impl LineClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::NumberedSection(_) => "numbered_section",
            Self::StrongHeading(_) => "strong_heading",
            Self::TableBoundary => "table_boundary",
            Self::SubgroupOpener(_) => "subgroup_opener",
            Self::GroupingOrInstruction => "grouping_or_instruction",
            Self::Content => "content",
        }
    }
}

/// Every cue the state machine consults for one line. `class()` resolves them in
/// priority order; the machine also reads individual cues (a table boundary can
/// still open a subgroup).
#[derive(Debug, Clone)]
pub struct LineFacts {
    pub numbered_section: Option<String>,
    pub strong_heading: Option<String>,
    pub table_boundary: bool,
    pub subgroup: Option<String>,
    pub grouping: bool,
    pub has_glyph: bool,
    pub label_or_header: bool,
}

impl LineFacts {
    pub fn class(&self) -> LineClass {
        if let Some(section) = &self.numbered_section {
            return LineClass::NumberedSection(section.clone());
        }
        if let Some(section) = &self.strong_heading {
            return LineClass::StrongHeading(section.clone());
        }
        if self.table_boundary {
            return LineClass::TableBoundary;
        }
        if let Some(subgroup) = &self.subgroup {
            return LineClass::SubgroupOpener(subgroup.clone());
        }
        if self.grouping {
            return LineClass::GroupingOrInstruction;
        }
        LineClass::Content
    }
}

impl FormParser {
    pub fn classify_line(&self, raw: &str, next: Option<&str>) -> LineClass {
        let line = raw.trim();
        if line.is_empty() {
            return LineClass::Blank;
        }
        self.line_facts(line, next).class()
    }

    pub(super) fn line_facts(&self, line: &str, next: Option<&str>) -> LineFacts {
        LineFacts {
            numbered_section: self
                .patterns
                .numbered_section
                .captures(line)
                .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
                .map(|title| self.normalize_section_name(title.as_str())),
            strong_heading: self
                .is_strong_heading(line)
                .then(|| self.normalize_section_name(line)),
            table_boundary: self.is_table_boundary(line),
            subgroup: self.detect_subgroup(line, next),
            grouping: self.looks_like_grouping_or_instruction(line),
            has_glyph: self.has_glyph(line),
            label_or_header: is_likely_label_or_header(line),
        }
    }

    fn is_strong_heading(&self, line: &str) -> bool {
        let line = line.trim();
        self.rules
            .strong_headings
            .iter()
            .any(|heading| heading == line)
    }

    pub(super) fn is_table_boundary(&self, line: &str) -> bool {
        let lower = line.trim().to_lowercase();
        self.rules
            .table_boundaries
            .iter()
            .any(|opener| lower.starts_with(opener.as_str()))
    }

    /// A `Title:` line opens a subgroup only when the next line shows grouped content.
    fn detect_subgroup(&self, line: &str, next: Option<&str>) -> Option<String> {
        if !line.ends_with(':') || line.chars().count() <= 3 || line.matches(':').count() > 1 {
            return None;
        }

        let next = next.map(str::trim).filter(|next| !next.is_empty())?;
        if self.has_glyph(next) || next.contains(':') {
            return Some(self.normalize_section_name(&line.replace(':', "")));
        }
        None
    }

    pub fn looks_like_grouping_or_instruction(&self, line: &str) -> bool {
        let lower = line.trim().to_lowercase();
        if self.patterns.pure_grouping.is_match(&lower) {
            return true;
        }
        if lower.starts_with('(') && lower.ends_with(')') {
            return true;
        }

        self.rules
            .instruction_contains
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
            || self
                .rules
                .instruction_prefixes
                .iter()
                .any(|prefix| lower.starts_with(prefix.as_str()))
    }

    pub(super) fn has_glyph(&self, line: &str) -> bool {
        line.chars().any(|ch| self.rules.is_glyph(ch))
    }
}

/// Lines that read as a label or header rather than a value.
pub(super) fn is_likely_label_or_header(line: &str) -> bool {
    line.ends_with(':')
        || line.chars().count() < 3
        || (line.chars().any(char::is_alphabetic) && line == line.to_uppercase())
}
