//! Method names, the rename placeholder and the name-provider capability.
//!
//! The engine never reads standard input directly. Callers hand it a
//! [`MethodNameProvider`], which is asked for a name only when the request
//! did not carry one.

use std::fmt;
use std::io::{self, BufRead, Write};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::core::errors::{ExtractError, Result};

/// A legal Ruby method name: `[a-z_][a-zA-Z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodName(String);

impl MethodName {
    /// Validate `raw` exactly as given. Prompt providers trim what the
    /// operator typed before it gets here.
    pub fn parse(raw: &str) -> Result<Self> {
        if is_legal_method_name(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ExtractError::illegal_method_name(raw))
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for MethodName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

fn is_legal_method_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Pick a placeholder identifier that does not already occur in `source`.
///
/// `base` is used as-is when it is absent from the text; otherwise `_1`,
/// `_2`, ... suffixes are tried in order.
pub fn choose_placeholder(source: &str, base: &str) -> String {
    if !source.contains(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !source.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Source of the final method name when the request does not carry one.
pub trait MethodNameProvider {
    /// Ask for a name. `Ok(None)` means the source had nothing to give
    /// (end of input, operator declined).
    fn provide_name(&mut self) -> Result<Option<String>>;
}

/// Resolve the final method name: an explicit name wins, otherwise the
/// provider is consulted. Empty, missing and malformed names all fail.
pub fn resolve_method_name(
    explicit: Option<&str>,
    provider: &mut dyn MethodNameProvider,
) -> Result<MethodName> {
    let raw = match explicit {
        Some(name) => Some(name.to_string()),
        None => provider.provide_name()?,
    };

    match raw {
        Some(name) => MethodName::parse(&name),
        None => Err(ExtractError::illegal_method_name("")),
    }
}

/// Provider that always answers with the same name.
#[derive(Debug, Clone)]
pub struct FixedName(pub String);

impl FixedName {
    /// Provider answering `name` every time.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl MethodNameProvider for FixedName {
    fn provide_name(&mut self) -> Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Provider that never has a name; useful when a name is mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoName;

impl MethodNameProvider for NoName {
    fn provide_name(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}

const PROMPT: &str = "Enter the new method name (a legal Ruby method name):";

/// Line-oriented prompt over any reader/writer pair.
pub struct PromptNameProvider<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptNameProvider<R, W> {
    /// Prompt on `writer`, read answers from `reader`.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl PromptNameProvider<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> MethodNameProvider for PromptNameProvider<R, W> {
    fn provide_name(&mut self) -> Result<Option<String>> {
        writeln!(self.writer, "{PROMPT}")?;
        self.writer.flush()?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            debug!("Name prompt reached end of input");
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Interactive prompt for a real terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNameProvider;

impl MethodNameProvider for TerminalNameProvider {
    fn provide_name(&mut self) -> Result<Option<String>> {
        let answer: String = dialoguer::Input::new()
            .with_prompt(PROMPT.trim_end_matches(':'))
            .allow_empty(true)
            .interact_text()
            .map_err(|e| {
                ExtractError::io(
                    "Failed to read method name from terminal",
                    io::Error::new(io::ErrorKind::Other, e.to_string()),
                )
            })?;

        let trimmed = answer.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}
