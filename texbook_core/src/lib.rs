//! `texbook_core` turns a directory of source files into a single LaTeX
//! reference manual (a "code book"), driven by a JSON configuration.
//!
//! ## Processing Pipeline
//!
//! ```text
//! config.json
//!   → ConfigDocument (raw JSON, dotted-key access, overrides)
//!   → BookConfig (typed, every value defaulted)
//! src/ tree
//!   → TreeWalker (ordering, exclusion, descriptions, escaping)
//!   → ContentFragment (headings + listings)
//! template
//!   → lexer (literal runs, `{{NAME}}` markers, legacy marker)
//!   → TemplateProcessor (validate against the TokenTable, substitute)
//!   → build/<output>.tex
//!   → DocumentCompiler (xelatex) → output/<output>.pdf
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Loading `config.json` and resolving it into a [`BookConfig`].
//!
//! ## Key Types
//!
//! - [`BookProject`]: A project directory with its resolved configuration.
//! - [`TreeWalker`]: Walks the source tree into a [`ContentFragment`].
//! - [`TokenTable`]: The placeholder values derived from a [`BookConfig`].
//! - [`TemplateProcessor`]: Loads, validates and fills in templates.
//! - [`ValidationResult`]: What `validate` found wrong with a template.
//! - [`XelatexCompiler`]: Runs the external LaTeX compiler.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use texbook_core::BookProject;
//!
//! let project = BookProject::open(Path::new("."), None).unwrap();
//! let (tex_path, generated) = project.write_source().unwrap();
//! println!("{} listings written to {}", generated.listings, tex_path.display());
//! ```

pub use book::*;
pub use compiler::*;
pub use config::*;
pub use error::*;
pub use escape::*;
pub use fragment::*;
pub use placeholders::*;
pub use template::*;
pub use walker::*;
pub use workspace::*;

mod book;
mod compiler;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod escape;
mod fragment;
pub(crate) mod lexer;
mod placeholders;
mod template;
mod walker;
mod workspace;

#[cfg(test)]
mod __fixtures;
