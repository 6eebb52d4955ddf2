mod common;

use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use texbook_core::AnyEmptyResult;

#[test]
fn status_text() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[("src/a.cpp", ""), ("src/graph/b.cpp", ""), ("src/c.tmp", "")],
	)?;

	common::texbook_cmd()
		.arg("status")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("texbook status"))
		.stdout(predicates::str::is_match(r"Listed files\s+2")?)
		.stdout(predicates::str::is_match(r"Layout\s+landscape")?)
		.stdout(predicates::str::contains("build/ACM_Templates.tex (missing)"))
		.stdout(predicates::str::is_match(r"Compiler\s+xelatex \((available|not found)\)")?);

	Ok(())
}

#[test]
fn status_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "")])?;

	let output = common::texbook_cmd()
		.arg("status")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();
	let json: Value = serde_json::from_slice(&output)?;

	assert_eq!(json["source_files"], Value::from(1));
	assert_eq!(json["source_dir_exists"], Value::Bool(true));
	assert_eq!(json["layout"], Value::String("landscape".to_string()));
	assert_eq!(json["template"], Value::String("unified_template.tex".to_string()));
	assert_eq!(json["tex_exists"], Value::Bool(false));
	assert_eq!(json["compiler"], Value::String("xelatex".to_string()));
	assert!(json["compiler_available"].is_boolean());

	Ok(())
}

#[test]
fn placeholders_lists_every_token() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	let output = common::texbook_cmd()
		.arg("placeholders")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();
	let stdout = String::from_utf8(output)?;

	assert_eq!(stdout.lines().count(), 60);
	assert!(
		stdout
			.lines()
			.any(|line| line.starts_with("DOCUMENT_TITLE") && line.ends_with("Team Notebook"))
	);
	assert!(
		stdout
			.lines()
			.any(|line| line.starts_with("CUSTOM_TITLE_CONTENT") && line.contains("\\n"))
	);
	assert!(stdout.contains("AUTO_INSERTED_CONTENT"));

	Ok(())
}

#[test]
fn sample_creates_a_template_once() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("sample")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created template file"));

	let path = tmp.path().join("templates/sample_template.tex");
	let content = std::fs::read_to_string(&path)?;
	assert!(content.contains("{{AUTO_INSERTED_CONTENT}}"));

	std::fs::write(&path, "edited")?;
	common::texbook_cmd()
		.arg("sample")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));
	assert_eq!(std::fs::read_to_string(&path)?, "edited");

	Ok(())
}

#[test]
fn sample_template_validates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("sample")
		.arg("--name")
		.arg("mine.tex")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::texbook_cmd()
		.arg("validate")
		.arg("--template")
		.arg(tmp.path().join("templates/mine.tex"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}

#[test]
fn templates_marks_the_active_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("templates/unified_template.tex", ""),
			("templates/other.tex", ""),
			("templates/notes.txt", ""),
		],
	)?;

	common::texbook_cmd()
		.arg("templates")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("templates/other.tex\n"))
		.stdout(predicates::str::contains(
			"templates/unified_template.tex (active)",
		))
		.stdout(predicates::str::contains("notes.txt").not());

	Ok(())
}

#[test]
fn templates_without_a_template_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("templates")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("The built in template is used."));

	Ok(())
}

#[test]
fn clean_removes_auxiliary_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("build/ACM_Templates.tex", ""),
			("build/ACM_Templates.aux", ""),
			("build/ACM_Templates.log", ""),
			("build/ACM_Templates.toc", ""),
		],
	)?;

	common::texbook_cmd()
		.arg("clean")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Removed 3 auxiliary file(s)."))
		.stdout(predicates::str::contains("build/ACM_Templates.aux"));

	assert!(tmp.path().join("build/ACM_Templates.tex").exists());
	assert!(!tmp.path().join("build/ACM_Templates.log").exists());

	common::texbook_cmd()
		.arg("clean")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No auxiliary files to remove."));

	Ok(())
}
