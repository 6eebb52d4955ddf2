use std::path::Path;
use std::path::PathBuf;

use crate::BookConfig;
use crate::ContentFragment;
use crate::FragmentBlock;
use crate::HeadingLevel;
use crate::LayoutMode;
use crate::Listing;
use crate::escape;

/// Comment lines mentioning any of these are never used as a description.
const DESCRIPTION_STOP_WORDS: [&str; 20] = [
	"#include",
	"using",
	"namespace",
	"define",
	"@brief",
	"@param",
	"@return",
	"@author",
	"@date",
	"@version",
	"@todo",
	"@note",
	"@warning",
	"@see",
	"@since",
	"@deprecated",
	"@file",
	"@class",
	"@struct",
	"@enum",
];

/// A name based exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludePattern {
	/// `*suffix`
	Suffix(String),
	/// `prefix*`
	Prefix(String),
	/// Any other text matches names containing it.
	Contains(String),
}

impl ExcludePattern {
	/// Empty patterns are ignored and return `None`.
	pub fn parse(pattern: &str) -> Option<Self> {
		if pattern.is_empty() {
			return None;
		}

		if let Some(suffix) = pattern.strip_prefix('*') {
			Some(Self::Suffix(suffix.to_string()))
		} else if let Some(prefix) = pattern.strip_suffix('*') {
			Some(Self::Prefix(prefix.to_string()))
		} else {
			Some(Self::Contains(pattern.to_string()))
		}
	}

	pub fn matches(&self, name: &str) -> bool {
		match self {
			Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
			Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
			Self::Contains(text) => name.contains(text.as_str()),
		}
	}
}

/// Turns a directory of code files into a [`ContentFragment`].
#[derive(Debug, Clone)]
pub struct TreeWalker {
	layout: LayoutMode,
	extensions: Vec<String>,
	excludes: Vec<ExcludePattern>,
	scan_lines: usize,
	max_description_lines: usize,
}

struct Entry {
	path: PathBuf,
	name: String,
	is_dir: bool,
}

impl TreeWalker {
	pub fn new(config: &BookConfig) -> Self {
		let files = &config.files;

		Self {
			layout: config.layout(),
			extensions: files
				.supported_extensions
				.iter()
				.map(|ext| ext.trim_start_matches('.').to_lowercase())
				.collect(),
			excludes: files
				.exclude_patterns
				.iter()
				.filter_map(|pattern| ExcludePattern::parse(pattern))
				.collect(),
			scan_lines: files.description_scan_lines,
			max_description_lines: files.description_max_lines,
		}
	}

	pub fn layout(&self) -> LayoutMode {
		self.layout
	}

	/// Whether a file or directory name matches one of the exclusion patterns.
	pub fn is_excluded(&self, name: &str) -> bool {
		self.excludes.iter().any(|pattern| pattern.matches(name))
	}

	/// Whether the file has one of the supported extensions.
	pub fn is_supported(&self, path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase())
			.is_some_and(|ext| self.extensions.contains(&ext))
	}

	/// Walk `directory`, emitting directory headings at `level` and deeper.
	///
	/// Children are listed directories first, then by case-insensitive name.
	/// Excluded names and symlinked directories are skipped entirely,
	/// unsupported files are skipped silently. A file that can't be read is still listed with a placeholder
	/// body, and a directory that can't be read contributes nothing.
	pub fn walk(&self, directory: &Path, level: usize) -> ContentFragment {
		let mut fragment = ContentFragment::new();

		for entry in Self::sorted_entries(directory) {
			if self.is_excluded(&entry.name) {
				tracing::debug!(path = %entry.path.display(), "excluded");
				continue;
			}

			if entry.is_dir {
				fragment.push(FragmentBlock::Heading {
					level: HeadingLevel::from_depth(level),
					title: escape(&entry.name),
				});
				fragment.append(self.walk(&entry.path, level + 1));
			} else if self.is_supported(&entry.path) {
				fragment.push(FragmentBlock::Listing(self.listing(&entry)));
			}
		}

		fragment
	}

	/// Number of files [`TreeWalker::walk`] would list below `directory`.
	pub fn count_files(&self, directory: &Path) -> usize {
		Self::sorted_entries(directory)
			.into_iter()
			.filter(|entry| !self.is_excluded(&entry.name))
			.map(|entry| {
				if entry.is_dir {
					self.count_files(&entry.path)
				} else {
					usize::from(self.is_supported(&entry.path))
				}
			})
			.sum()
	}

	fn sorted_entries(directory: &Path) -> Vec<Entry> {
		let read_dir = match std::fs::read_dir(directory) {
			Ok(read_dir) => read_dir,
			Err(e) => {
				tracing::warn!(path = %directory.display(), error = %e, "unable to read directory");
				return Vec::new();
			}
		};

		let mut entries: Vec<Entry> = read_dir
			.filter_map(Result::ok)
			.filter_map(|dir_entry| {
				let path = dir_entry.path();
				let file_type = dir_entry.file_type().ok()?;

				// Symlinked directories are never followed, which rules out cycles.
				if file_type.is_symlink() && path.is_dir() {
					tracing::debug!(path = %path.display(), "skipping symlinked directory");
					return None;
				}

				Some(Entry {
					name: dir_entry.file_name().to_string_lossy().into_owned(),
					is_dir: file_type.is_dir(),
					path,
				})
			})
			.collect();

		entries.sort_by(|a, b| {
			b.is_dir
				.cmp(&a.is_dir)
				.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
				.then_with(|| a.name.cmp(&b.name))
		});

		entries
	}

	fn listing(&self, entry: &Entry) -> Listing {
		let body = match std::fs::read(&entry.path) {
			Ok(bytes) => normalize_line_endings(&String::from_utf8_lossy(&bytes)),
			Err(e) => {
				tracing::warn!(path = %entry.path.display(), error = %e, "unable to read file");
				return Listing {
					name: escape(&entry.name),
					description: None,
					body: format!("// unable to read file: {e}"),
				};
			}
		};

		Listing {
			name: escape(&entry.name),
			description: self.description(&body).map(|text| escape(&text)),
			body,
		}
	}

	/// Collect a short description from `//` comments near the top of a file.
	pub fn description(&self, source: &str) -> Option<String> {
		let mut lines = Vec::new();

		for line in source.lines().take(self.scan_lines) {
			if lines.len() >= self.max_description_lines {
				break;
			}

			let line = line.trim();
			if !line.starts_with("//") || line.len() <= 3 {
				continue;
			}

			let text = line.trim_start_matches('/').trim();
			let lower = text.to_lowercase();
			let is_tag = text.starts_with('@')
				|| DESCRIPTION_STOP_WORDS
					.iter()
					.any(|word| lower.contains(word));

			if !text.is_empty() && !is_tag {
				lines.push(text);
			}
		}

		if lines.is_empty() {
			None
		} else {
			Some(lines.join(" "))
		}
	}
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}
