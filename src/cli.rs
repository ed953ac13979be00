use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "formflat",
    version,
    about = "Field extraction for flattened regulatory report forms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Flattened form text, or a PDF converted with pdftotext.
    #[arg(long)]
    pub input: PathBuf,

    /// JSON list of interactive form widgets used to seed the result.
    #[arg(long)]
    pub form_fields: Option<PathBuf>,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Writes the document here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub print_keys: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
