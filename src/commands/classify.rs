use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::build_parser;
use super::source::load_source;
use crate::cli::ClassifyArgs;
use crate::form::LineClass;

#[derive(Debug, Serialize)]
struct ClassifiedLine<'a> {
    line_number: usize,
    #[serde(flatten)]
    class: LineClass,
    line: &'a str,
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let parser = build_parser(args.rules.as_deref())?;
    let source = load_source(&args.input)?;

    let classified = source
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| ClassifiedLine {
            line_number: index + 1,
            class: parser.classify_line(line, source.lines.get(index + 1).map(String::as_str)),
            line: line.trim(),
        })
        .collect::<Vec<_>>();

    let content_lines = classified
        .iter()
        .filter(|entry| entry.class == LineClass::Content)
        .count();
    info!(
        lines = classified.len(),
        content_lines,
        "classification completed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &classified)
            .context("failed to serialize classification output")?;
        writeln!(output)?;
    } else {
        for entry in &classified {
            match &entry.class {
                LineClass::Blank => continue,
                LineClass::NumberedSection(name)
                | LineClass::StrongHeading(name)
                | LineClass::SubgroupOpener(name) => writeln!(
                    output,
                    "{}\t{}\t{}\t[{}]",
                    entry.line_number,
                    entry.class.as_str(),
                    entry.line,
                    name
                )?,
                _ => writeln!(
                    output,
                    "{}\t{}\t{}",
                    entry.line_number,
                    entry.class.as_str(),
                    entry.line
                )?,
            }
        }
    }
    output.flush()?;
    Ok(())
}
