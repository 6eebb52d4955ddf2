use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use texbook_core::AnyEmptyResult;

pub const CONFIG: &str = r#"{
  "project": { "title": "Team Notebook", "author": "Team" },
  "build": { "layout": "landscape" },
  "files": { "supported_extensions": [".cpp"], "exclude_patterns": ["*.tmp"] },
  "page_layout": {},
  "typography": {},
  "code_style": {},
  "table_of_contents": {}
}
"#;

pub fn texbook_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("texbook"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TEXBOOK_LOG");
	cmd
}

/// Write `config.json` and the given files below `root`.
pub fn write_project(root: &Path, files: &[(&str, &str)]) -> AnyEmptyResult {
	std::fs::write(root.join("config.json"), CONFIG)?;

	for (relative, content) in files {
		let path = root.join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}

	Ok(())
}
