mod common;

use serde_json::Value;
use texbook_core::AnyEmptyResult;

#[test]
fn builtin_template_is_valid() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "")])?;

	common::texbook_cmd()
		.arg("validate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("unified_template.tex (built in)"))
		.stdout(predicates::str::contains("Template is valid."));

	Ok(())
}

#[test]
fn invalid_template_fails_validation() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[("templates/broken.tex", "{{DOCUMENT_TITLE}} {{NOPE}} {{ZZZ}}\n")],
	)?;

	common::texbook_cmd()
		.arg("validate")
		.arg("--template")
		.arg(tmp.path().join("templates/broken.tex"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("undefined placeholders: NOPE, ZZZ"))
		.stderr(predicates::str::contains(
			"missing required placeholders: AUTO_INSERTED_CONTENT",
		));

	Ok(())
}

#[test]
fn validate_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[(
			"templates/unified_template.tex",
			"{{DOCUMENT_TITLE}}\n{{AUTO_INSERTED_CONTENT}}\n{{MISSING_THING}}\n",
		)],
	)?;

	let output = common::texbook_cmd()
		.arg("validate")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.get_output()
		.stdout
		.clone();
	let json: Value = serde_json::from_slice(&output)?;

	assert_eq!(json["valid"], Value::Bool(false));
	assert_eq!(
		json["found"],
		serde_json::json!(["AUTO_INSERTED_CONTENT", "DOCUMENT_TITLE", "MISSING_THING"])
	);
	assert_eq!(json["undefined"], serde_json::json!(["MISSING_THING"]));
	assert_eq!(json["missing_required"], serde_json::json!([]));
	assert_eq!(json["available"].as_array().map(Vec::len), Some(60));

	Ok(())
}

#[test]
fn validate_legacy_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[(
			"templates/landscape_template.tex",
			"\\begin{document}\n%__AUTO_INSERTED_CONTENT__\n\\end{document}\n",
		)],
	)?;

	common::texbook_cmd()
		.arg("config")
		.arg("set")
		.arg("build.use_unified_template")
		.arg("false")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::texbook_cmd()
		.arg("validate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("has an insertion marker"));

	std::fs::write(
		tmp.path().join("templates/landscape_template.tex"),
		"\\begin{document}\n\\end{document}\n",
	)?;

	common::texbook_cmd()
		.arg("validate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("has no insertion marker"));

	Ok(())
}

#[test]
fn validate_missing_template_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("validate")
		.arg("--template")
		.arg(tmp.path().join("nope.tex"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("texbook::template_load"));

	Ok(())
}
