use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;

use crate::TexbookResult;

/// Files LaTeX leaves behind next to the PDF.
pub const AUXILIARY_PATTERNS: [&str; 7] = [
	"*.aux",
	"*.log",
	"*.out",
	"*.toc",
	"*.fls",
	"*.fdb_latexmk",
	"*.synctex.gz",
];

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[&str]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		if let Ok(glob) = Glob::new(pattern) {
			builder.add(glob);
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Files directly inside `dir` whose names match `patterns`, sorted. A missing
/// directory has no files.
pub fn matching_files(dir: &Path, patterns: &[&str]) -> TexbookResult<Vec<PathBuf>> {
	if !dir.is_dir() {
		return Ok(Vec::new());
	}

	let glob_set = build_glob_set(patterns);
	let mut files = Vec::new();

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		if path.is_file() && glob_set.is_match(entry.file_name()) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}

/// Delete LaTeX auxiliary files from `dir` and return what was removed.
/// Files that can't be removed are logged and skipped.
pub fn clean_auxiliary_files(dir: &Path) -> TexbookResult<Vec<PathBuf>> {
	let mut removed = Vec::new();

	for path in matching_files(dir, &AUXILIARY_PATTERNS)? {
		match std::fs::remove_file(&path) {
			Ok(()) => {
				tracing::debug!(path = %path.display(), "removed auxiliary file");
				removed.push(path);
			}
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "unable to remove auxiliary file");
			}
		}
	}

	Ok(removed)
}

/// The `.tex` templates in `dir`, sorted by name.
pub fn list_templates(dir: &Path) -> TexbookResult<Vec<PathBuf>> {
	matching_files(dir, &["*.tex"])
}
