use std::path::Path;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use crate::BookConfig;
use crate::ConfigDocument;

/// Write every `(relative path, content)` pair below `root`, creating parent
/// directories. Paths ending in `/` create an empty directory.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
	for (relative, content) in files {
		let path = root.join(relative);
		if relative.ends_with('/') {
			std::fs::create_dir_all(&path)
				.unwrap_or_else(|e| panic!("create_dir_all {}: {e}", path.display()));
			continue;
		}
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.unwrap_or_else(|e| panic!("create_dir_all {}: {e}", parent.display()));
		}
		std::fs::write(&path, content)
			.unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	}
}

pub fn tree(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write_tree(tmp.path(), files);
	tmp
}

pub fn resolve(value: Value) -> BookConfig {
	ConfigDocument::from_value(value)
		.resolve()
		.unwrap_or_else(|e| panic!("resolve: {e}"))
}

/// A config declaring every required section.
pub fn project_config() -> Value {
	json!({
		"project": { "title": "Team Notebook", "author": "Team" },
		"build": { "layout": "landscape" },
		"files": { "supported_extensions": [".cpp"], "exclude_patterns": ["*.tmp"] },
		"page_layout": {},
		"typography": {},
		"code_style": {},
		"table_of_contents": {}
	})
}

/// A config that sets a value for every section, in the shapes older config
/// files used.
pub fn full_config() -> Value {
	json!({
		"project": {
			"title": "ICPC Notebook",
			"author": "Team Rocket",
			"subtitle": "World Finals",
			"date": "2024"
		},
		"build": { "layout": "portrait", "output_filename": "notebook" },
		"files": { "supported_extensions": ["cpp", ".hpp"], "exclude_patterns": ["draft*"] },
		"page_layout": {
			"margins": { "portrait": { "left": "1cm", "top": "1.2cm" } },
			"column_separation": "0.6cm"
		},
		"typography": {
			"fonts": { "main": "Latin Modern Roman", "code": "Fira Code" },
			"colors": { "section": "black", "code_number": "gray!60" }
		},
		"code_style": {
			"appearance": { "font_size": "8pt", "break_lines": false, "line_numbers": false },
			"formatting": { "tab_size": 2, "line_spacing": 0.25 },
			"spacing": { "above_skip": "1pt" }
		},
		"spacing": { "page_style": "empty", "header_footer": "\\fancyhf{}" },
		"table_of_contents": {
			"structure": { "depth": 2 },
			"styling": { "fonts": { "section": "\\bfseries" } },
			"spacing": { "before_toc": "\\vspace{1em}", "after_toc": "" }
		},
		"title_page_content": { "enabled": false }
	})
}

/// A project directory with `config.json` and the given files.
pub fn project(config: &Value, files: &[(&str, &str)]) -> TempDir {
	let tmp = tree(files);
	let content = serde_json::to_string_pretty(config).unwrap_or_else(|e| panic!("json: {e}"));
	write_tree(tmp.path(), &[("config.json", &content)]);
	tmp
}
