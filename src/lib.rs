//! # rextract: Extract-Method Refactoring for Ruby
//!
//! Rewrites a Ruby source file so that a selected fragment is replaced by a
//! call to a newly synthesized method containing that fragment.
//!
//! - **Structural strategy**: parses the file with tree-sitter, finds the
//!   fragment as a syntax node, classifies the enclosing method (instance,
//!   `def self.`, or inside `class << self`) and rewrites the tree.
//! - **Text strategy**: works on the raw line array with a windowed search
//!   and a `def`/`end` keyword scan. No parse is needed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    API (ExtractEngine)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core            │  Refactor                 │  Language     │
//! │ • Config         │ • Structural: locate →    │ • Syntax tree │
//! │ • Errors         │   context → transform →   │ • Ruby parser │
//! │ • Naming         │   rename                  │ • Printer     │
//! │ • Pipeline       │ • Text: window → scan →   │               │
//! │                  │   splice                  │               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rextract::{ExtractConfig, ExtractEngine, ExtractRequest, NoName};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ExtractEngine::new(ExtractConfig::default())?;
//!     let request = ExtractRequest::new("lib/calculator.rb", "apply_tax(result, items)", 4, 4)
//!         .with_method_name("calculate_with_tax");
//!
//!     let outcome = engine.run(&request, &mut NoName)?;
//!     println!("Extracted into {}", outcome.method_name);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Core engine modules
pub mod core {
    //! Configuration, errors, naming and the extraction pipeline.

    pub mod config;
    pub mod errors;
    pub mod naming;
    pub mod pipeline;
}

// Syntax tree model and the Ruby adapter
pub mod lang {
    //! Language-specific parsing and printing.

    pub mod common;
    pub mod printer;
    pub mod ruby;
}

// Extraction strategies
pub mod refactor {
    //! The two extraction strategies.

    pub mod structural;
    pub mod text;
}

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
}

// Re-export primary types for convenience
pub use crate::api::engine::{extract_method, ExtractEngine};
pub use crate::core::config::{ExtractConfig, StrategyKind};
pub use crate::core::errors::{ExtractError, FailureStage, Result, ResultExt};
pub use crate::core::naming::{
    FixedName, MethodName, MethodNameProvider, NoName, PromptNameProvider, TerminalNameProvider,
};
pub use crate::core::pipeline::{
    ExtractOutcome, ExtractRequest, ExtractionStage, ExtractionStrategy, Extractor, MethodKind,
};
pub use crate::refactor::structural::StructuralStrategy;
pub use crate::refactor::text::TextStrategy;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
