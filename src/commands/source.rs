use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBackend {
    Text,
    Pdftotext,
}

impl SourceBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdftotext => "pdftotext",
        }
    }
}

#[derive(Debug)]
pub struct SourceText {
    pub backend: SourceBackend,
    pub lines: Vec<String>,
}

pub fn load_source(path: &Path) -> Result<SourceText> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let (backend, raw) = if is_pdf {
        if !command_available("pdftotext") {
            bail!(
                "pdftotext is required to read {} but was not found on PATH",
                path.display()
            );
        }
        (SourceBackend::Pdftotext, extract_text_with_pdftotext(path)?)
    } else {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read text source {}", path.display()))?;
        (SourceBackend::Text, raw)
    };

    let lines = split_lines(&raw);
    info!(
        path = %path.display(),
        backend = backend.as_str(),
        line_count = lines.len(),
        "loaded source text"
    );

    Ok(SourceText { backend, lines })
}

fn command_available(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

fn extract_text_with_pdftotext(pdf_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let text = String::from_utf8_lossy(&output.stdout)
        .replace('\u{000C}', "\n")
        .replace('\u{0000}', "");
    debug!(path = %pdf_path.display(), chars = text.len(), "pdftotext finished");
    Ok(text)
}

fn split_lines(raw: &str) -> Vec<String> {
    raw.lines().map(ToOwned::to_owned).collect()
}
