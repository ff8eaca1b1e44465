//! Error types for the rextract library.
//!
//! Every stage of an extraction returns one of these errors instead of
//! panicking. The orchestrator short-circuits on the first failure, so no
//! partially rewritten file is ever persisted.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main result type for rextract operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Stage of the extraction at which a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Reading or writing the file
    File,
    /// Finding the fragment
    Locate,
    /// Finding the enclosing method
    Context,
    /// Choosing the method name
    Name,
    /// Parsing source text
    Parse,
    /// Other I/O
    Io,
    /// Loading or validating configuration
    Config,
    /// Broken engine invariant
    Internal,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::File => "file",
            Self::Locate => "locate",
            Self::Context => "context",
            Self::Name => "name",
            Self::Parse => "parse",
            Self::Io => "io",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// Error type for all extraction operations.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The target file does not exist
    #[error("File {} not found", path.display())]
    FileNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// No node / line window matched the requested fragment
    #[error("Could not locate target code snippet at line {line}, column {column}")]
    FragmentNotLocated {
        /// 1-based line hint
        line: usize,
        /// Column hint
        column: usize,
        /// Snippet text as supplied by the caller
        snippet: String,
    },

    /// No method definition brackets the fragment
    #[error("Could not find the method enclosing line {line}")]
    EnclosingMethodNotFound {
        /// First line of the located fragment
        line: usize,
    },

    /// The requested method name is empty or not a legal identifier
    #[error("Illegal method name: '{name}' (must start with a lowercase letter or underscore, followed by letters, digits or underscores)")]
    IllegalMethodName {
        /// The rejected name
        name: String,
    },

    /// Parsing and language processing errors
    #[error("Parse error in {language}: {message}")]
    Parse {
        /// Language being parsed
        language: String,
        /// Error description
        message: String,
        /// Line number (if available)
        line: Option<usize>,
        /// Column number (if available)
        column: Option<usize>,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Broken internal invariant
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl ExtractError {
    /// Create a file-not-found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a fragment-not-located error
    pub fn fragment_not_located(line: usize, column: usize, snippet: impl Into<String>) -> Self {
        Self::FragmentNotLocated {
            line,
            column,
            snippet: snippet.into(),
        }
    }

    /// Create an enclosing-method-not-found error
    pub fn enclosing_method_not_found(line: usize) -> Self {
        Self::EnclosingMethodNotFound { line }
    }

    /// Create an illegal-method-name error
    pub fn illegal_method_name(name: impl Into<String>) -> Self {
        Self::IllegalMethodName { name: name.into() }
    }

    /// Create a new parse error
    pub fn parse(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a new parse error with a source position
    pub fn parse_at(
        language: impl Into<String>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if let Self::Internal { context: ctx, .. } = &mut self {
            *ctx = Some(context.into());
        }
        self
    }

    /// The pipeline stage this error is reported against
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::FileNotFound { .. } => FailureStage::File,
            Self::FragmentNotLocated { .. } => FailureStage::Locate,
            Self::EnclosingMethodNotFound { .. } => FailureStage::Context,
            Self::IllegalMethodName { .. } => FailureStage::Name,
            Self::Parse { .. } => FailureStage::Parse,
            Self::Io { .. } => FailureStage::Io,
            Self::Config { .. } | Self::Serialization { .. } => FailureStage::Config,
            Self::Internal { .. } => FailureStage::Internal,
        }
    }
}

impl From<io::Error> for ExtractError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ExtractError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ExtractError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
