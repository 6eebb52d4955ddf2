mod common;

use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use serde_json::Value;
use similar_asserts::assert_eq;
use texbook_core::AnyEmptyResult;

#[rstest]
#[case::string("build.layout", "landscape\n")]
#[case::nested("project.title", "Team Notebook\n")]
#[case::list("files.exclude_patterns", "[\n  \"*.tmp\"\n]\n")]
#[case::object("page_layout", "{}\n")]
fn config_get(#[case] key: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	let output = common::texbook_cmd()
		.arg("config")
		.arg("get")
		.arg(key)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();

	assert_eq!(String::from_utf8(output)?, expected);

	Ok(())
}

#[test]
fn config_get_unknown_key_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("config")
		.arg("get")
		.arg("build.nothing_here")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains(
			"config key `build.nothing_here` is not set",
		));

	Ok(())
}

#[test]
fn config_set_saves_typed_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	for (key, value) in [
		("code_style.appearance.font_size", "7pt"),
		("code_style.appearance.line_numbers", "false"),
		("files.supported_extensions", r#"[".cpp", ".h"]"#),
		("title_page_content.description", "Our notebook"),
	] {
		common::texbook_cmd()
			.arg("config")
			.arg("set")
			.arg(key)
			.arg(value)
			.arg("--path")
			.arg(tmp.path())
			.assert()
			.success()
			.stdout(predicates::str::contains(format!("Set {key} = ")));
	}

	let content = std::fs::read_to_string(tmp.path().join("config.json"))?;
	let config: Value = serde_json::from_str(&content)?;

	assert_eq!(
		config["code_style"]["appearance"]["font_size"],
		Value::String("7pt".to_string())
	);
	assert_eq!(
		config["code_style"]["appearance"]["line_numbers"],
		Value::Bool(false)
	);
	assert_eq!(
		config["files"]["supported_extensions"],
		serde_json::json!([".cpp", ".h"])
	);
	assert_eq!(
		config["title_page_content"]["description"],
		Value::String("Our notebook".to_string())
	);
	assert_eq!(config["project"]["title"], Value::String("Team Notebook".to_string()));

	Ok(())
}

#[test]
fn config_check_passes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("config")
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Configuration is valid."));

	Ok(())
}

#[test]
fn config_check_reports_warnings() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("config")
		.arg("set")
		.arg("build.layout")
		.arg("sideways")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::texbook_cmd()
		.arg("config")
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"warning: build.layout `sideways` is not recognised, using portrait",
		))
		.stderr(predicates::str::contains("not recognised").not());

	Ok(())
}

#[test]
fn config_check_rejects_missing_sections() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("config.json"),
		r#"{ "project": { "title": "x" } }"#,
	)?;

	common::texbook_cmd()
		.arg("config")
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("texbook::missing_config_module"));

	Ok(())
}

#[rstest]
#[case::missing(None, "texbook::config_read")]
#[case::empty(Some("{}"), "texbook::config_empty")]
#[case::invalid(Some("{ not json"), "texbook::config_parse")]
fn broken_config_files(#[case] content: Option<&str>, #[case] code: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	if let Some(content) = content {
		std::fs::write(tmp.path().join("config.json"), content)?;
	}

	common::texbook_cmd()
		.arg("status")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains(code));

	Ok(())
}

#[test]
fn explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "int a;\n")])?;
	std::fs::rename(
		tmp.path().join("config.json"),
		tmp.path().join("book.json"),
	)?;

	common::texbook_cmd()
		.arg("config")
		.arg("get")
		.arg("project.author")
		.arg("--config")
		.arg(tmp.path().join("book.json"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("Team\n");

	Ok(())
}
