use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::build_parser;
use super::source::load_source;
use crate::cli::ExtractArgs;
use crate::form::{ExtractionDocument, ExtractionOutcome, FieldEntry};
use crate::model::{ExtractionCounts, ExtractionRunManifest, FormFieldRecord, SourceEntry};
use crate::util::{now_utc_string, read_json, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let run_id = format!("extract-{}", utc_compact_string(Utc::now()));
    let started_at = now_utc_string();

    let parser = build_parser(args.rules.as_deref())?;
    let source = load_source(&args.input)?;

    let form_fields: Vec<FormFieldRecord> = match &args.form_fields {
        Some(path) => read_json(path)
            .with_context(|| format!("invalid form field export {}", path.display()))?,
        None => Vec::new(),
    };
    let seed = parser.seed_from_form_fields(&form_fields);
    let seeded_field_count = seed.document.len();

    let outcome = parser.extract(&source.lines, seed);
    let counts = summarize(source.lines.len(), seeded_field_count, &outcome);

    info!(
        run_id = %run_id,
        lines = counts.line_count,
        seeded = counts.seeded_field_count,
        fields = counts.output_field_count,
        mandatory = counts.mandatory_field_count,
        dropped = counts.dropped_field_count,
        review_flags = outcome.review_flags.len(),
        "extraction completed"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &outcome.document)?;
            info!(path = %path.display(), "wrote extracted document");
        }
        None if !args.print_keys => write_document_stdout(&outcome.document)?,
        None => {}
    }

    if args.print_keys {
        write_keys_stdout(&outcome.document)?;
    }

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = ExtractionRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            completed_at: now_utc_string(),
            source: SourceEntry {
                path: args.input.display().to_string(),
                sha256: sha256_file(&args.input)?,
                backend: source.backend.as_str().to_string(),
            },
            form_fields_path: display_path(args.form_fields.as_deref()),
            rules_path: display_path(args.rules.as_deref()),
            output_path: display_path(args.output.as_deref()),
            counts,
            review_flags: outcome.review_flags,
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote extraction manifest");
    }

    Ok(())
}

fn summarize(
    line_count: usize,
    seeded_field_count: usize,
    outcome: &ExtractionOutcome,
) -> ExtractionCounts {
    let output_field_count = outcome.document.len();
    let mandatory_field_count = outcome
        .document
        .iter()
        .filter(|(_, entry)| matches!(entry, FieldEntry::Envelope { .. }))
        .count();

    ExtractionCounts {
        line_count,
        seeded_field_count,
        raw_field_count: outcome.raw_field_count,
        output_field_count,
        mandatory_field_count,
        dropped_field_count: outcome.raw_field_count.saturating_sub(output_field_count),
    }
}

fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|value| value.display().to_string())
}

fn write_document_stdout(document: &ExtractionDocument) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, document)
        .context("failed to serialize extracted document")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_keys_stdout(document: &ExtractionDocument) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    for (key, entry) in document.iter() {
        writeln!(output, "{key}\t{entry}")?;
    }
    output.flush()?;
    Ok(())
}
