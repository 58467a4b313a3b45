//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Locus: resolve business-level field names into ordered element locators
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the cache key for a field
    Key(KeyArgs),

    /// Resolve a field to its locator candidates
    Resolve(ResolveArgs),

    /// Validate a locator configuration file
    Validate(ValidateArgs),
}

/// A field on a page
#[derive(clap::Args, Debug, Clone)]
pub struct FieldArgs {
    /// Page name (e.g. SearchPage)
    #[arg(short, long)]
    pub page: String,

    /// Field type (button, input, select, checkbox, radio, text, link,
    /// textarea, label, image)
    #[arg(short = 't', long)]
    pub field_type: String,

    /// Field name, optionally with an instance suffix (e.g. "Address[2]")
    #[arg(short, long)]
    pub name: String,

    /// Field value, for value-bearing field types
    #[arg(long)]
    pub value: Option<String>,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Pattern code
    #[arg(short, long, default_value = locus::DEFAULT_PATTERN_CODE)]
    pub code: String,

    /// The field
    #[command(flatten)]
    pub field: FieldArgs,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Locator configuration file (YAML, or JSON by extension)
    #[arg(long)]
    pub config: PathBuf,

    /// Pattern code, overriding the configuration's default
    #[arg(short, long)]
    pub code: Option<String>,

    /// The field
    #[command(flatten)]
    pub field: FieldArgs,

    /// Generated-entry cache file, loaded before and saved after resolving
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Document snapshot (YAML map of selector to elements) to match against
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Locator configuration file (YAML, or JSON by extension)
    #[arg(long)]
    pub config: PathBuf,

    /// Fail when any field type lacks a pattern
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
