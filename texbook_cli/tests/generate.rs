mod common;

use predicates::prelude::PredicateBooleanExt;
use texbook_core::AnyEmptyResult;

#[test]
fn generate_writes_the_document_source() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("src/Graph/dfs.cpp", "// Depth first search\nint main() {}\n"),
			("src/Math/gcd.cpp", "int gcd(int a, int b);\n"),
		],
	)?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Created build/ACM_Templates.tex (2 listing(s)).",
		));

	let tex = std::fs::read_to_string(tmp.path().join("build/ACM_Templates.tex"))?;
	assert!(tex.contains("\\section{Graph}"));
	assert!(tex.contains("\\subsubsection{dfs.cpp}"));
	assert!(tex.contains("\\textit{Depth first search}\\par"));
	assert!(tex.contains("\\title{Team Notebook"));
	assert!(!tex.contains("{{AUTO_INSERTED_CONTENT}}"));

	Ok(())
}

#[test]
fn generate_twice_is_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "int a;\n")])?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("is already up to date"));

	Ok(())
}

#[test]
fn generate_diff_shows_changed_lines() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "int old_value;\n")])?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	std::fs::write(tmp.path().join("src/a.cpp"), "int new_value;\n")?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated build/ACM_Templates.tex"))
		.stdout(predicates::str::contains("-int old_value;"))
		.stdout(predicates::str::contains("+int new_value;"));

	Ok(())
}

#[test]
fn generate_skips_excluded_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("src/keep.cpp", "int keep;\n"),
			("src/scratch.tmp", "int scratch;\n"),
			("src/notes.md", "# notes\n"),
		],
	)?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("(1 listing(s))"));

	let tex = std::fs::read_to_string(tmp.path().join("build/ACM_Templates.tex"))?;
	assert!(tex.contains("int keep;"));
	assert!(!tex.contains("int scratch;"));
	assert!(!tex.contains("# notes"));

	Ok(())
}

#[test]
fn generate_uses_the_project_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("src/a.cpp", "int a;\n"),
			(
				"templates/unified_template.tex",
				"% {{DOCUMENT_AUTHOR}}\n{{AUTO_INSERTED_CONTENT}}",
			),
		],
	)?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("template:"))
		.stdout(predicates::str::contains("(built in)").not());

	let tex = std::fs::read_to_string(tmp.path().join("build/ACM_Templates.tex"))?;
	assert!(tex.starts_with("% Team\n\\subsubsection{a.cpp}\n"));

	Ok(())
}

#[test]
fn generate_refuses_an_invalid_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(
		tmp.path(),
		&[
			("src/a.cpp", "int a;\n"),
			("templates/unified_template.tex", "{{NOT_A_TOKEN}}\n"),
		],
	)?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("texbook::invalid_template"));

	assert!(!tmp.path().join("build/ACM_Templates.tex").exists());

	Ok(())
}

#[test]
fn generate_requires_the_source_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[])?;

	common::texbook_cmd()
		.arg("generate")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("texbook::missing_source_directory"));

	Ok(())
}

#[test]
fn build_without_compiling() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("code/a.cpp", "int a;\n")])?;

	common::texbook_cmd()
		.arg("build")
		.arg("--no-compile")
		.arg("--output")
		.arg("notebook")
		.arg("--template-dir")
		.arg("code")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote build/notebook.tex (1 listing(s))."));

	assert!(tmp.path().join("build/notebook.tex").is_file());
	// Overrides are never written back to the config file.
	let config = std::fs::read_to_string(tmp.path().join("config.json"))?;
	assert_eq!(config, common::CONFIG);

	Ok(())
}

#[test]
fn build_reports_a_missing_compiler() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path(), &[("src/a.cpp", "int a;\n")])?;

	common::texbook_cmd()
		.arg("config")
		.arg("set")
		.arg("build.compiler")
		.arg("texbook-test-missing-compiler")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::texbook_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("texbook::compiler_not_found"));

	assert!(tmp.path().join("build/ACM_Templates.tex").is_file());
	assert!(!tmp.path().join("output").exists());

	Ok(())
}

#[test]
fn no_subcommand_prints_usage_hint() -> AnyEmptyResult {
	common::texbook_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("texbook --help"));

	Ok(())
}
