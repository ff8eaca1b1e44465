//! Syntax-tree based extraction.
//!
//! The file is parsed, the fragment is found as a node, the enclosing
//! method is classified, the tree is rewritten around a unique placeholder
//! name, and the placeholder is finally renamed to the requested name.

pub mod context;
pub mod locator;
pub mod rename;
pub mod transform;

use std::sync::Arc;

use tracing::debug;

use crate::core::config::ExtractConfig;
use crate::core::errors::{ExtractError, Result, ResultExt};
use crate::core::naming::{choose_placeholder, resolve_method_name, MethodNameProvider};
use crate::core::pipeline::{ExtractionStage, ExtractionStrategy, FragmentTarget, Rewrite};
use crate::lang::common::{SourceParser, SourcePrinter, SyntaxNode, SyntaxTree};
use crate::lang::printer::RubyPrinter;
use crate::lang::ruby::RubyAdapter;

pub use context::{ContextAnalyzer, MethodContext};
pub use rename::Renamer;
pub use transform::{InsertionPoint, TreeTransformer};

/// Structural strategy over any parser/printer pair.
pub struct StructuralStrategy<P = RubyAdapter, W = RubyPrinter> {
    parser: P,
    printer: W,
    placeholder: String,
    validate_output: bool,
}

impl StructuralStrategy {
    /// Ruby strategy configured from `config`.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self::with_components(
            RubyAdapter::new()?,
            RubyPrinter::with_indent_unit(config.indent_unit()),
            config,
        ))
    }
}

impl<P: SourceParser, W: SourcePrinter> StructuralStrategy<P, W> {
    /// Strategy over an explicit parser and printer.
    pub fn with_components(parser: P, printer: W, config: &ExtractConfig) -> Self {
        Self {
            parser,
            printer,
            placeholder: config.placeholder.clone(),
            validate_output: config.validate_output,
        }
    }
}

impl<P: SourceParser, W: SourcePrinter> ExtractionStrategy for StructuralStrategy<P, W> {
    type Document = SyntaxTree;
    type Fragment = Arc<SyntaxNode>;
    type Context = MethodContext;

    fn name(&self) -> &'static str {
        "structural"
    }

    fn load(&mut self, source: &str) -> Result<SyntaxTree> {
        self.parser.parse(source)
    }

    fn locate(&self, tree: &SyntaxTree, target: &FragmentTarget) -> Result<Arc<SyntaxNode>> {
        locator::locate(tree, target).ok_or_else(|| {
            ExtractError::fragment_not_located(target.line, target.column, &target.snippet)
        })
    }

    fn classify_context(&self, tree: &SyntaxTree, fragment: &Arc<SyntaxNode>) -> Result<MethodContext> {
        ContextAnalyzer::analyze(tree, fragment)
    }

    fn rewrite(
        &mut self,
        tree: SyntaxTree,
        fragment: Arc<SyntaxNode>,
        context: MethodContext,
        names: &mut dyn MethodNameProvider,
    ) -> Result<Rewrite> {
        let placeholder = choose_placeholder(tree.source(), &self.placeholder);
        let transformed =
            TreeTransformer::for_tree(&tree).transform(&tree, &fragment, &context, &placeholder)?;
        debug!(placeholder = %placeholder, "Fragment replaced by placeholder call");

        let method_name = resolve_method_name(None, names)?;
        let renamed = Renamer::new(&placeholder, method_name.as_str()).rename_tree(&transformed);
        let source = self.printer.print(&renamed).context("printing rewritten tree")?;

        if self.validate_output {
            self.parser.parse(&source).map_err(|err| match err {
                ExtractError::Parse {
                    language,
                    message,
                    line,
                    column,
                } => ExtractError::Parse {
                    language,
                    message: format!("rewritten source no longer parses: {message}"),
                    line,
                    column,
                },
                other => other,
            })?;
        }

        Ok(Rewrite {
            source,
            method_name,
            kind: context.kind,
            stage: ExtractionStage::Renamed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::FixedName;
    use pretty_assertions::assert_eq;

    /// Printer that drops the closing keyword of every file.
    struct TruncatingPrinter;

    impl SourcePrinter for TruncatingPrinter {
        fn print(&self, tree: &SyntaxTree) -> Result<String> {
            let source = RubyPrinter::new().print(tree)?;
            Ok(source.trim_end().trim_end_matches("end").to_string())
        }
    }

    fn run<W: SourcePrinter>(
        strategy: &mut StructuralStrategy<RubyAdapter, W>,
        source: &str,
        snippet: &str,
        line: usize,
        column: usize,
    ) -> Result<Rewrite> {
        let target = FragmentTarget {
            line,
            column,
            snippet: snippet.to_string(),
        };
        let tree = strategy.load(source)?;
        let fragment = strategy.locate(&tree, &target)?;
        let context = strategy.classify_context(&tree, &fragment)?;
        strategy.rewrite(tree, fragment, context, &mut FixedName::new("helper"))
    }

    #[test]
    fn test_rewrite_produces_renamed_method() {
        let mut strategy = StructuralStrategy::new(&ExtractConfig::default()).unwrap();
        let rewrite = run(&mut strategy, "def run\n  work\n  done\nend\n", "work", 2, 2).unwrap();

        assert_eq!(
            rewrite.source,
            "def run\n  helper\n  done\nend\n\ndef helper\n  work\nend\n"
        );
        assert_eq!(rewrite.method_name.as_str(), "helper");
        assert_eq!(rewrite.stage, ExtractionStage::Renamed);
    }

    #[test]
    fn test_unparsable_output_reports_single_parse_error() {
        let mut strategy = StructuralStrategy::with_components(
            RubyAdapter::new().unwrap(),
            TruncatingPrinter,
            &ExtractConfig::default(),
        );
        let err = run(&mut strategy, "def run\n  work\n  done\nend\n", "work", 2, 2).unwrap_err();

        let message = err.to_string();
        assert_eq!(message.matches("Parse error").count(), 1, "{message}");
        assert!(message.contains("rewritten source no longer parses"));
        assert!(matches!(err, ExtractError::Parse { line: Some(_), .. }));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let config = ExtractConfig {
            validate_output: false,
            ..ExtractConfig::default()
        };
        let mut strategy =
            StructuralStrategy::with_components(RubyAdapter::new().unwrap(), TruncatingPrinter, &config);
        let rewrite = run(&mut strategy, "def run\n  work\n  done\nend\n", "work", 2, 2).unwrap();
        assert!(!rewrite.source.ends_with("end"));
    }
}
