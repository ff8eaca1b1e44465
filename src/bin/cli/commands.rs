//! Command execution for the rextract binary.

use std::io::IsTerminal;

use anyhow::Context;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::cli::args::{ExtractArgs, InitConfigArgs, ValidateConfigArgs};
use crate::cli::config_layer::build_extract_config;
use rextract::core::pipeline::report_failure;
use rextract::{
    ExtractConfig, ExtractEngine, ExtractOutcome, ExtractRequest, PromptNameProvider,
    TerminalNameProvider,
};

/// Run a single extraction. Returns `Ok(false)` when the extraction
/// failed; the diagnostic has already been printed.
pub fn extract_command(args: ExtractArgs) -> anyhow::Result<bool> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let config = build_extract_config(&args, &cwd)?;
    debug!(?config, "Effective configuration");

    let mut request = ExtractRequest::new(&args.file, &args.snippet, args.line, args.column);
    if let Some(name) = &args.name {
        request = request.with_method_name(name);
    }

    let strategy = config.strategy;
    let engine = ExtractEngine::new(config)?;

    let result = if std::io::stdin().is_terminal() {
        engine.run(&request, &mut TerminalNameProvider)
    } else {
        engine.run(&request, &mut PromptNameProvider::stdio())
    };

    match result {
        Ok(outcome) => {
            print_outcome(&outcome, args.json)?;
            Ok(true)
        }
        Err(err) => {
            report_failure(&strategy.to_string(), &err);
            Ok(false)
        }
    }
}

fn print_outcome(outcome: &ExtractOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if !outcome.written {
        print!("{}", outcome.source);
        eprintln!(
            "{} {}",
            "🔎 Dry run, file not modified:".yellow(),
            outcome.path.display()
        );
        return Ok(());
    }

    println!(
        "{} '{}' ({} method, {} strategy) in {}",
        "✅ Extracted fragment into method".bright_green().bold(),
        outcome.method_name.to_string().cyan(),
        outcome.kind,
        outcome.strategy,
        outcome.path.display()
    );
    Ok(())
}

/// Print default configuration
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default rextract configuration".dimmed());
    println!("{}", "# Save this to .rextract.yml and customize as needed".dimmed());
    println!();

    let yaml_output = serde_yaml::to_string(&ExtractConfig::default())?;
    println!("{}", yaml_output);
    Ok(())
}

/// Initialize a configuration file with defaults. Returns `Ok(false)` when
/// the file exists and `--force` was not given.
pub fn init_config(args: InitConfigArgs) -> anyhow::Result<bool> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        return Ok(false);
    }

    ExtractConfig::default()
        .to_yaml_file(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "🔧 Key settings you can customize:".bright_blue().bold());
    println!("   strategy        structural | text");
    println!("   search_radius   lines searched around the hint (text strategy)");
    println!("   indent_width    indentation of synthesized method bodies");
    println!("   validate_output re-parse the result before writing");
    Ok(true)
}

/// Validate a configuration file. Returns `Ok(false)` when it is invalid.
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<bool> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );

    match ExtractConfig::from_yaml_file(&args.config) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!("   strategy:        {}", config.strategy);
            println!("   search_radius:   {}", config.search_radius);
            println!("   placeholder:     {}", config.placeholder);
            println!("   indent_width:    {}", config.indent_width);
            println!("   validate_output: {}", config.validate_output);
            println!("   dry_run:         {}", config.dry_run);
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            eprintln!(
                "{}",
                "💡 Tip: Use 'rextract print-default-config' to see valid format".dimmed()
            );
            Ok(false)
        }
    }
}
