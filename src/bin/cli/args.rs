//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the rextract binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use rextract::StrategyKind;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract-method refactoring for Ruby
#[derive(Parser)]
#[command(name = "rextract")]
#[command(version = VERSION)]
#[command(about = "✂️  rextract - Extract-method refactoring for Ruby sources")]
#[command(long_about = "
Replace a fragment of a Ruby method with a call to a new method containing
that fragment. The new method keeps the binding of the method it came from:
instance methods stay instance methods, `def self.` and `class << self`
fragments become `def self.` methods.

Common Usage:

  # Extract a statement into an instance method
  rextract extract lib/calculator.rb 'apply_tax(result, items)' 4 4 calculate_with_tax

  # Preview the rewrite without touching the file
  rextract extract --dry-run lib/calculator.rb 'apply_tax(result, items)' 4 4 calculate_with_tax

  # Use the line-based strategy with a wider search window
  rextract extract --strategy text --search-radius 8 lib/calculator.rb 'apply_tax(result, items)' 6 4 helper

  # Write a starter configuration file
  rextract init-config
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a code fragment into a new method
    Extract(ExtractArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a rextract configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Ruby source file to rewrite
    pub file: PathBuf,

    /// Exact text of the fragment to extract
    pub snippet: String,

    /// 1-based line on which the fragment starts
    pub line: usize,

    /// 0-based column at which the fragment starts
    pub column: usize,

    /// Name of the new method (prompted for when omitted)
    pub name: Option<String>,

    /// Extraction strategy (overrides the configuration file)
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Configuration file (defaults to .rextract.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the rewritten source instead of writing the file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Half-width of the text strategy's search window, in lines
    #[arg(long)]
    pub search_radius: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Syntax-tree rewrite (precise)
    Structural,
    /// Line-based rewrite (no parse needed)
    Text,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Structural => StrategyKind::Structural,
            StrategyArg::Text => StrategyKind::Text,
        }
    }
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".rextract.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,
}
