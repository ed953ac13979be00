use tracing::debug;

use super::parser::FormParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// `Label: ☒`
    LabelBox { label: String, checked: bool },
    /// `☒ Label`
    BoxLabel { label: String, checked: bool },
    /// `Label: value`
    LabelValue { label: String, value: String },
}

impl LineMatch {
    pub fn is_checkbox(&self) -> bool {
        !matches!(self, Self::LabelValue { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::LabelBox { label, .. }
            | Self::BoxLabel { label, .. }
            | Self::LabelValue { label, .. } => label,
        }
    }
}

/// Label:value pairs found in a glyph-free stretch of text.
#[derive(Debug, Default)]
struct PairScan {
    /// Text before the first label (the box label when the stretch follows a glyph).
    lead: String,
    pairs: Vec<(String, String)>,
    /// A final `Label:` with nothing after it; may bind to the next glyph.
    trailing_label: Option<String>,
}

impl FormParser {
    /// Runs the three shape matchers across one line, left to right.
    pub fn match_line(&self, line: &str) -> Vec<LineMatch> {
        let mut matches = Vec::new();
        let mut pending_label: Option<String> = None;

        for (glyph, text) in self.glyph_segments(line) {
            let Some(glyph) = glyph else {
                let scan = self.scan_pairs(text, false);
                push_pairs(&mut matches, scan.pairs);
                pending_label = scan.trailing_label;
                continue;
            };

            let checked = self.rules.is_checked(glyph);
            let mut scan = self.scan_pairs(text, true);

            if scan.lead.is_empty() {
                if let Some(label) = pending_label.take() {
                    matches.push(LineMatch::LabelBox { label, checked });
                } else if !scan.pairs.is_empty() {
                    let (label, dropped) = scan.pairs.remove(0);
                    debug!(label = %label, value = %dropped, "box label followed by stray value");
                    matches.push(LineMatch::BoxLabel { label, checked });
                } else if let Some(label) = scan.trailing_label.take() {
                    matches.push(LineMatch::BoxLabel { label, checked });
                } else {
                    debug!(line = %line, "checkbox glyph without a label");
                }
            } else {
                if let Some(caption) = pending_label.take() {
                    debug!(caption = %caption, "label caption ahead of checkbox options");
                }
                matches.push(LineMatch::BoxLabel {
                    label: scan.lead,
                    checked,
                });
            }

            push_pairs(&mut matches, scan.pairs);
            pending_label = scan.trailing_label;
        }

        matches
    }

    fn glyph_segments<'a>(&self, line: &'a str) -> Vec<(Option<char>, &'a str)> {
        let mut segments = Vec::new();
        let mut glyph = None;
        let mut start = 0;

        for (index, ch) in line.char_indices() {
            if self.rules.is_glyph(ch) {
                segments.push((glyph, &line[start..index]));
                glyph = Some(ch);
                start = index + ch.len_utf8();
            }
        }
        segments.push((glyph, &line[start..]));

        segments
    }

    fn scan_pairs(&self, text: &str, after_glyph: bool) -> PairScan {
        let pieces = text.split(':').collect::<Vec<_>>();
        if pieces.len() == 1 {
            return PairScan {
                lead: text.trim().to_string(),
                ..PairScan::default()
            };
        }

        let mut scan = PairScan::default();
        let mut current_label = if after_glyph {
            let (lead, label) = self.split_label_boundary(pieces[0]);
            scan.lead = lead;
            label
        } else {
            self.label_tail(pieces[0])
        };

        let mut carry = String::new();
        let last_index = pieces.len() - 1;
        for (index, piece) in pieces.iter().enumerate().skip(1) {
            let is_last = index == last_index;
            let (value_part, next_label) = if is_last {
                (piece.trim().to_string(), None)
            } else {
                self.split_label_boundary(piece)
            };

            // A colon inside a value ("10:30") leaves no label behind it.
            if !is_last && next_label.is_none() {
                carry.push_str(piece);
                carry.push(':');
                continue;
            }

            let value = format!("{carry}{value_part}").trim().to_string();
            carry.clear();

            if let Some(label) = current_label.take() {
                if !value.is_empty() {
                    scan.pairs.push((label, value));
                } else if is_last {
                    scan.trailing_label = Some(label);
                }
            }
            current_label = next_label;
        }

        scan
    }

    /// Splits `value Label` text. The label is the run of label words before the
    /// colon: capitalized words, parentheticals and lowercase connectors. The
    /// first word of the piece stays with the value unless it is the only word.
    fn split_label_boundary(&self, piece: &str) -> (String, Option<String>) {
        let mut word_starts = Vec::new();
        let mut previous_whitespace = true;
        for (index, ch) in piece.char_indices() {
            if !ch.is_whitespace() && previous_whitespace {
                word_starts.push(index);
            }
            previous_whitespace = ch.is_whitespace();
        }

        let Some(&last_start) = word_starts.last() else {
            return (String::new(), None);
        };

        let mut label_start = last_start;
        for pair in word_starts[1..].windows(2).rev() {
            let (start, end) = (pair[0], pair[1]);
            if !is_label_word(&piece[start..end]) {
                break;
            }
            label_start = start;
        }
        while label_start != last_start {
            let word_end = piece[label_start..]
                .find(char::is_whitespace)
                .map_or(piece.len(), |offset| label_start + offset);
            if !is_connector(&piece[label_start..word_end]) {
                break;
            }
            label_start = word_starts
                .iter()
                .copied()
                .find(|&start| start > label_start)
                .unwrap_or(last_start);
        }

        for start in [label_start, last_start] {
            let candidate = piece[start..].trim();
            match self.label_tail(candidate) {
                Some(label) if label == candidate && label.chars().any(char::is_alphabetic) => {
                    return (piece[..start].trim().to_string(), Some(label));
                }
                _ => {}
            }
        }
        (piece.trim().to_string(), None)
    }

    /// Trailing run of label characters.
    fn label_tail(&self, text: &str) -> Option<String> {
        self.patterns
            .label_tail
            .find(text.trim_end())
            .map(|found| found.as_str().trim().to_string())
            .filter(|label| !label.is_empty())
    }
}

const LABEL_CONNECTORS: [&str; 12] = [
    "of", "the", "and", "or", "to", "for", "in", "on", "at", "by", "per", "with",
];

fn is_connector(word: &str) -> bool {
    LABEL_CONNECTORS.contains(&word.trim())
}

fn is_label_word(word: &str) -> bool {
    let word = word.trim();
    word.starts_with('(')
        || is_connector(word)
        || word
            .trim_start_matches(|ch: char| !ch.is_alphanumeric())
            .starts_with(char::is_uppercase)
}

fn push_pairs(matches: &mut Vec<LineMatch>, pairs: Vec<(String, String)>) {
    matches.extend(
        pairs
            .into_iter()
            .map(|(label, value)| LineMatch::LabelValue { label, value }),
    );
}
