//! Main extraction engine.

use tracing::info;

use crate::core::config::{ExtractConfig, StrategyKind};
use crate::core::errors::Result;
use crate::core::naming::{MethodNameProvider, PromptNameProvider};
use crate::core::pipeline::{report_failure, ExtractOutcome, ExtractRequest, Extractor};
use crate::refactor::structural::StructuralStrategy;
use crate::refactor::text::TextStrategy;

/// Main rextract engine: picks a strategy from configuration and runs it.
pub struct ExtractEngine {
    config: ExtractConfig,
}

impl ExtractEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        info!(
            strategy = %config.strategy,
            dry_run = config.dry_run,
            "Initialized extraction engine"
        );
        Ok(Self { config })
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Run the configured strategy.
    pub fn run(
        &self,
        request: &ExtractRequest,
        names: &mut dyn MethodNameProvider,
    ) -> Result<ExtractOutcome> {
        self.run_with(self.config.strategy, request, names)
    }

    /// Run a specific strategy regardless of configuration.
    pub fn run_with(
        &self,
        strategy: StrategyKind,
        request: &ExtractRequest,
        names: &mut dyn MethodNameProvider,
    ) -> Result<ExtractOutcome> {
        match strategy {
            StrategyKind::Structural => Extractor::new(StructuralStrategy::new(&self.config)?)
                .dry_run(self.config.dry_run)
                .run(request, names),
            StrategyKind::Text => Extractor::new(TextStrategy::new(&self.config))
                .dry_run(self.config.dry_run)
                .run(request, names),
        }
    }

    /// `true` on success; on failure prints one diagnostic line and
    /// returns `false`.
    pub fn extract(&self, request: &ExtractRequest, names: &mut dyn MethodNameProvider) -> bool {
        match self.config.strategy {
            StrategyKind::Structural => match StructuralStrategy::new(&self.config) {
                Ok(strategy) => Extractor::new(strategy)
                    .dry_run(self.config.dry_run)
                    .extract(request, names),
                Err(err) => {
                    report_failure("structural", &err);
                    false
                }
            },
            StrategyKind::Text => Extractor::new(TextStrategy::new(&self.config))
                .dry_run(self.config.dry_run)
                .extract(request, names),
        }
    }
}

/// Extract `snippet` (starting at `line`/`column`) from `path` into a new
/// method with the default configuration. When `method_name` is `None` the
/// name is read from standard input.
pub fn extract_method(
    path: &str,
    snippet: &str,
    line: usize,
    column: usize,
    method_name: Option<&str>,
) -> bool {
    let mut request = ExtractRequest::new(path, snippet, line, column);
    if let Some(name) = method_name {
        request = request.with_method_name(name);
    }

    match ExtractEngine::new(ExtractConfig::default()) {
        Ok(engine) => engine.extract(&request, &mut PromptNameProvider::stdio()),
        Err(err) => {
            report_failure("structural", &err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ExtractError;
    use crate::core::naming::NoName;
    use std::fs;
    use tempfile::tempdir;

    const SOURCE: &str = "class Greeter\n  def greet(name)\n    message = \"Hello, #{name}\"\n    puts message\n  end\nend\n";

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = ExtractConfig {
            indent_width: 0,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            ExtractEngine::new(config),
            Err(ExtractError::Config { .. })
        ));
    }

    #[test]
    fn test_both_strategies_agree_on_simple_case() {
        let dir = tempdir().unwrap();
        let mut outputs = Vec::new();

        for strategy in [StrategyKind::Structural, StrategyKind::Text] {
            let path = dir.path().join(format!("{strategy}.rb"));
            fs::write(&path, SOURCE).unwrap();

            let engine = ExtractEngine::new(ExtractConfig {
                strategy,
                ..ExtractConfig::default()
            })
            .unwrap();
            let request = ExtractRequest::new(&path, "puts message", 4, 4).with_method_name("show");
            let outcome = engine.run(&request, &mut NoName).unwrap();
            assert!(outcome.written);
            outputs.push(fs::read_to_string(&path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
        assert!(outputs[0].contains("  def show\n    puts message\n  end\n"));
    }

    #[test]
    fn test_dry_run_config_is_honoured() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greeter.rb");
        fs::write(&path, SOURCE).unwrap();

        let engine = ExtractEngine::new(ExtractConfig {
            dry_run: true,
            ..ExtractConfig::default()
        })
        .unwrap();
        let request = ExtractRequest::new(&path, "puts message", 4, 4).with_method_name("show");
        let outcome = engine.run(&request, &mut NoName).unwrap();

        assert!(!outcome.written);
        assert!(outcome.source.contains("def show"));
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
    }

    #[test]
    fn test_extract_reports_success_and_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greeter.rb");
        fs::write(&path, SOURCE).unwrap();

        let engine = ExtractEngine::new(ExtractConfig::default()).unwrap();
        let missing = ExtractRequest::new(&path, "puts farewell", 4, 4).with_method_name("show");
        assert!(!engine.extract(&missing, &mut NoName));
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);

        let request = ExtractRequest::new(&path, "puts message", 4, 4).with_method_name("show");
        assert!(engine.extract(&request, &mut NoName));
        assert!(fs::read_to_string(&path).unwrap().contains("  def show\n"));
    }
}
