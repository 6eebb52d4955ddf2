use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::BookConfig;
use crate::CONTENT_TOKEN;
use crate::LayoutMode;
use crate::TOKEN_NAMES;
use crate::TexbookError;
use crate::TexbookResult;
use crate::TokenTable;
use crate::lexer::LEGACY_MARKER;
use crate::lexer::Segment;
use crate::lexer::tokenize;

/// File name of the default unified template.
pub const DEFAULT_TEMPLATE_NAME: &str = "unified_template.tex";

/// The unified template bundled with the crate, used when a project doesn't
/// provide its own.
pub const BUILTIN_TEMPLATE: &str = include_str!("../templates/unified_template.tex");

/// A minimal starting point for new templates.
pub const SAMPLE_TEMPLATE: &str = include_str!("../templates/sample_template.tex");

/// The bundled template for the single marker mode.
pub const BUILTIN_LEGACY_TEMPLATE: &str = include_str!("../templates/legacy_template.tex");

/// The template name used for a layout when unified templates are disabled.
pub fn legacy_template_name(layout: LayoutMode) -> String {
	format!("{layout}_template.tex")
}

/// Outcome of checking a template against the known token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
	pub valid: bool,
	/// Every marker name that appears in the template.
	pub found: BTreeSet<String>,
	/// Every marker name the processor can substitute.
	pub available: BTreeSet<String>,
	/// Markers in the template with no known value.
	pub undefined: BTreeSet<String>,
	/// Required markers the template doesn't contain.
	pub missing_required: BTreeSet<String>,
	/// Human readable summary, one entry per problem.
	pub messages: Vec<String>,
}

/// Loads, validates and fills in document templates.
///
/// Template text is cached by path for the lifetime of the processor, so
/// every template file is read at most once.
#[derive(Debug)]
pub struct TemplateProcessor<'a> {
	config: &'a BookConfig,
	cache: HashMap<PathBuf, String>,
}

impl<'a> TemplateProcessor<'a> {
	pub fn new(config: &'a BookConfig) -> Self {
		Self {
			config,
			cache: HashMap::new(),
		}
	}

	/// Read the template at `path`, or return the cached text if it was read
	/// before.
	pub fn load(&mut self, path: &Path) -> TexbookResult<&str> {
		if self.cache.contains_key(path) {
			tracing::debug!(path = %path.display(), "template cache hit");
		} else {
			let text = std::fs::read_to_string(path).map_err(|e| {
				TexbookError::TemplateLoad {
					path: path.display().to_string(),
					reason: e.to_string(),
				}
			})?;
			tracing::debug!(path = %path.display(), "loaded template");
			self.cache.insert(path.to_path_buf(), text);
		}

		Ok(self
			.cache
			.get(path)
			.map_or("", String::as_str))
	}

	/// The token table for the current configuration with `body` inserted
	/// under [`CONTENT_TOKEN`].
	pub fn token_table(&self, body: &str) -> TokenTable {
		TokenTable::from_config(self.config).with_content(body)
	}

	/// Every marker name a template may use, sorted.
	pub fn available_placeholders() -> BTreeSet<String> {
		TOKEN_NAMES
			.iter()
			.chain([CONTENT_TOKEN].iter())
			.map(|name| (*name).to_string())
			.collect()
	}

	/// Check that every marker in `template` is known and that the content
	/// marker is present.
	pub fn validate(&self, template: &str) -> ValidationResult {
		let found = find_markers(template);
		let available = Self::available_placeholders();
		let undefined: BTreeSet<String> = found.difference(&available).cloned().collect();
		let missing_required: BTreeSet<String> = [CONTENT_TOKEN.to_string()]
			.into_iter()
			.filter(|name| !found.contains(name))
			.collect();

		let mut messages = Vec::new();
		if !undefined.is_empty() {
			messages.push(format!(
				"undefined placeholders: {}",
				join_names(&undefined)
			));
		}
		if !missing_required.is_empty() {
			messages.push(format!(
				"missing required placeholders: {}",
				join_names(&missing_required)
			));
		}
		let valid = messages.is_empty();
		if valid {
			messages.push("template is valid".to_string());
		}

		ValidationResult {
			valid,
			found,
			available,
			undefined,
			missing_required,
			messages,
		}
	}

	/// Replace every known `{{NAME}}` marker with its value and the content
	/// marker with `body`.
	///
	/// Markers without a value are left in place. Substituted values are
	/// never scanned again, and the legacy insertion marker is left alone.
	pub fn process(&self, template: &str, body: &str) -> String {
		let table = self.token_table(body);
		let mut output = String::with_capacity(template.len() + body.len());

		for segment in tokenize(template) {
			match segment {
				Segment::Literal(text) => output.push_str(text),
				Segment::Marker(name) => {
					match table.get(name) {
						Some(value) => output.push_str(value),
						None => {
							tracing::debug!(name, "leaving unknown placeholder in place");
							output.push_str(&segment.source_text());
						}
					}
				}
				Segment::LegacyMarker => output.push_str(LEGACY_MARKER),
			}
		}

		output
	}

	/// Insert `body` before every legacy marker, keeping the marker so the
	/// insertion can be repeated. `{{NAME}}` markers are left alone.
	///
	/// If the template has no legacy marker it is returned unchanged and a
	/// warning is logged.
	pub fn insert_legacy(&self, template: &str, body: &str) -> String {
		if !has_legacy_marker(template) {
			tracing::warn!(marker = LEGACY_MARKER, "template has no insertion marker");
			return template.to_string();
		}

		let mut output = String::with_capacity(template.len() + body.len());
		for segment in tokenize(template) {
			match segment {
				Segment::LegacyMarker => {
					output.push_str(body);
					output.push_str(LEGACY_MARKER);
				}
				other => output.push_str(&other.source_text()),
			}
		}

		output
	}
}

/// Names of every `{{NAME}}` marker in `template`.
pub fn find_markers(template: &str) -> BTreeSet<String> {
	tokenize(template)
		.into_iter()
		.filter_map(|segment| {
			match segment {
				Segment::Marker(name) => Some(name.to_string()),
				_ => None,
			}
		})
		.collect()
}

/// Whether `template` contains the legacy insertion marker.
pub fn has_legacy_marker(template: &str) -> bool {
	tokenize(template)
		.iter()
		.any(|segment| matches!(segment, Segment::LegacyMarker))
}

fn join_names(names: &BTreeSet<String>) -> String {
	names
		.iter()
		.map(String::as_str)
		.collect::<Vec<_>>()
		.join(", ")
}
