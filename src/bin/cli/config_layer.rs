//! Configuration Layer Management
//!
//! Defaults, then a configuration file (explicit or discovered), then CLI
//! overrides, each layer taking priority over the previous one.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::cli::args::ExtractArgs;
use rextract::core::config::StrategyKind;
use rextract::ExtractConfig;

/// Partial configuration carried by CLI flags
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub strategy: Option<StrategyKind>,
    pub search_radius: Option<usize>,
    pub dry_run: bool,
}

/// Merge another configuration layer into this one, with the other taking priority
pub trait ConfigMerge<T> {
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    fn from_cli_args(args: &T) -> Self;
}

impl FromCliArgs<ExtractArgs> for CliOverrides {
    fn from_cli_args(args: &ExtractArgs) -> Self {
        Self {
            strategy: args.strategy.map(StrategyKind::from),
            search_radius: args.search_radius,
            dry_run: args.dry_run,
        }
    }
}

impl ConfigMerge<CliOverrides> for ExtractConfig {
    fn merge_with(&mut self, other: CliOverrides) {
        if let Some(strategy) = other.strategy {
            self.strategy = strategy;
        }
        if let Some(radius) = other.search_radius {
            self.search_radius = radius;
        }
        // a flag can only switch dry-run on
        self.dry_run |= other.dry_run;
    }
}

/// Load the file layer: the explicit path, else an implicit file in `cwd`,
/// else defaults.
pub fn load_file_layer(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<ExtractConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => ExtractConfig::discover(cwd),
    };

    match path {
        Some(path) => {
            debug!(config = %path.display(), "Loading configuration file");
            ExtractConfig::from_yaml_file(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(ExtractConfig::default()),
    }
}

/// Build the effective configuration for an `extract` invocation.
pub fn build_extract_config(args: &ExtractArgs, cwd: &Path) -> anyhow::Result<ExtractConfig> {
    let mut config = load_file_layer(args.config.as_deref(), cwd)?;
    config.merge_with(CliOverrides::from_cli_args(args));
    config
        .validate()
        .context("Invalid configuration after applying command-line overrides")?;
    Ok(config)
}
