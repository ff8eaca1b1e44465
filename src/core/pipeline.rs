//! Extraction pipeline that drives a strategy from file to file.
//!
//! An [`ExtractionStrategy`] knows how to load, search, classify and rewrite
//! one representation of a Ruby file. The [`Extractor`] owns the file I/O
//! around it: exactly one read before the strategy runs and at most one
//! write after it succeeded. Any failure leaves the file untouched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::errors::{ExtractError, Result};
use crate::core::naming::{FixedName, MethodName, MethodNameProvider};

/// How the extracted method is bound, inherited from the method the
/// fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// `def name`
    Instance,
    /// `def self.name`
    Static,
    /// Plain `def` inside a `class << self` block
    SingletonContext,
}

impl MethodKind {
    /// Whether the new method must be defined on the class object.
    pub fn is_type_level(self) -> bool {
        !matches!(self, Self::Instance)
    }
}

impl std::fmt::Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance => f.write_str("instance"),
            Self::Static => f.write_str("static"),
            Self::SingletonContext => f.write_str("singleton-context"),
        }
    }
}

/// Progress marker of a single extraction, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStage {
    /// Reading the file and searching for the fragment
    Searching,
    /// Fragment found
    Located,
    /// Enclosing method classified
    ContextResolved,
    /// Tree or lines rewritten around the placeholder
    Rewritten,
    /// Placeholder renamed to the final name
    Renamed,
    /// New source written to disk
    Persisted,
    /// Aborted with an error
    Failed,
}

/// The fragment a caller wants extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTarget {
    /// 1-based line of the first character
    pub line: usize,
    /// 0-based character column of the first character
    pub column: usize,
    /// Exact source text, compared after trimming surrounding whitespace
    pub snippet: String,
}

/// A complete extraction request.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// File to rewrite
    pub path: PathBuf,
    /// Fragment to extract
    pub target: FragmentTarget,
    /// Final method name; the name provider is asked when absent
    pub method_name: Option<String>,
}

impl ExtractRequest {
    /// Request for `snippet` starting at `line` (1-based) and `column` (0-based).
    pub fn new(path: impl Into<PathBuf>, snippet: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            path: path.into(),
            target: FragmentTarget {
                line,
                column,
                snippet: snippet.into(),
            },
            method_name: None,
        }
    }

    /// Use `name` instead of asking a name provider.
    pub fn with_method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }
}

/// What a strategy hands back after a successful rewrite.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// Complete new file contents
    pub source: String,
    /// Validated final name
    pub method_name: MethodName,
    /// Binding of the new method
    pub kind: MethodKind,
    /// Last stage the strategy completed
    pub stage: ExtractionStage,
}

/// One extraction pipeline over its own document representation.
pub trait ExtractionStrategy {
    /// Parsed form of the whole file
    type Document;
    /// Located fragment inside a document
    type Fragment;
    /// Enclosing-method information for a fragment
    type Context;

    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Turn the file contents into a document.
    fn load(&mut self, source: &str) -> Result<Self::Document>;

    /// Find the requested fragment.
    fn locate(&self, document: &Self::Document, target: &FragmentTarget) -> Result<Self::Fragment>;

    /// Find the method around the fragment.
    fn classify_context(
        &self,
        document: &Self::Document,
        fragment: &Self::Fragment,
    ) -> Result<Self::Context>;

    /// Produce the rewritten file. `names` is consulted for the final
    /// method name.
    fn rewrite(
        &mut self,
        document: Self::Document,
        fragment: Self::Fragment,
        context: Self::Context,
        names: &mut dyn MethodNameProvider,
    ) -> Result<Rewrite>;
}

/// Result of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractOutcome {
    /// Rewritten file
    pub path: PathBuf,
    /// Strategy that ran
    pub strategy: &'static str,
    /// Name of the new method
    pub method_name: MethodName,
    /// Binding of the new method
    pub kind: MethodKind,
    /// Last stage reached
    pub stage: ExtractionStage,
    /// Whether the file on disk was replaced
    pub written: bool,
    /// Rewritten source (also available in dry runs)
    #[serde(skip)]
    pub source: String,
}

/// Runs a strategy against a file on disk.
pub struct Extractor<S> {
    strategy: S,
    dry_run: bool,
}

impl<S: ExtractionStrategy> Extractor<S> {
    /// Extractor that writes the file on success.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            dry_run: false,
        }
    }

    /// Compute the rewrite without writing the file.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the full pipeline, returning the first error encountered.
    pub fn run(
        &mut self,
        request: &ExtractRequest,
        names: &mut dyn MethodNameProvider,
    ) -> Result<ExtractOutcome> {
        let path = request.path.as_path();
        if !path.is_file() {
            return Err(ExtractError::file_not_found(path));
        }

        let source = fs::read_to_string(path)
            .map_err(|e| ExtractError::io(format!("Failed to read {}", path.display()), e))?;

        self.trace(ExtractionStage::Searching, path);
        let document = self.strategy.load(&source)?;
        let fragment = self.strategy.locate(&document, &request.target)?;
        self.trace(ExtractionStage::Located, path);

        let context = self.strategy.classify_context(&document, &fragment)?;
        self.trace(ExtractionStage::ContextResolved, path);

        let mut fixed;
        let names: &mut dyn MethodNameProvider = match &request.method_name {
            Some(name) => {
                fixed = FixedName::new(name.as_str());
                &mut fixed
            }
            None => names,
        };

        let rewrite = self.strategy.rewrite(document, fragment, context, names)?;
        self.trace(rewrite.stage, path);

        let mut stage = rewrite.stage;
        if !self.dry_run {
            persist(path, &rewrite.source)?;
            stage = ExtractionStage::Persisted;
            self.trace(stage, path);
        }

        info!(
            strategy = self.strategy.name(),
            method = %rewrite.method_name,
            kind = %rewrite.kind,
            file = %path.display(),
            "Extracted method"
        );

        Ok(ExtractOutcome {
            path: path.to_path_buf(),
            strategy: self.strategy.name(),
            method_name: rewrite.method_name,
            kind: rewrite.kind,
            stage,
            written: !self.dry_run,
            source: rewrite.source,
        })
    }

    /// Boolean entry point: `true` on success, otherwise a one-line
    /// diagnostic is printed to stderr and `false` is returned.
    pub fn extract(&mut self, request: &ExtractRequest, names: &mut dyn MethodNameProvider) -> bool {
        match self.run(request, names) {
            Ok(_) => true,
            Err(err) => {
                self.trace(ExtractionStage::Failed, &request.path);
                report_failure(self.strategy.name(), &err);
                false
            }
        }
    }

    fn trace(&self, stage: ExtractionStage, path: &Path) {
        debug!(
            strategy = self.strategy.name(),
            stage = ?stage,
            file = %path.display(),
            "Extraction stage"
        );
    }
}

/// Emit the single diagnostic line for a failed extraction.
pub fn report_failure(strategy: &str, err: &ExtractError) {
    debug!(stage = %err.stage(), strategy, error = ?err, "Extraction failed");
    eprintln!("Error ({} stage): {err}", err.stage());
}

fn persist(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| ExtractError::io(format!("Failed to write {}", path.display()), e))
}
