use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TexbookError {
	#[error(transparent)]
	#[diagnostic(code(texbook::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read config file `{path}`: {reason}")]
	#[diagnostic(
		code(texbook::config_read),
		help("run `texbook config check` from the project root, or pass `--config <file>`")
	)]
	ConfigRead { path: String, reason: String },

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(
		code(texbook::config_parse),
		help("check that the config file is valid JSON")
	)]
	ConfigParse { path: String, reason: String },

	#[error("config file `{0}` is empty")]
	#[diagnostic(
		code(texbook::config_empty),
		help("the config must be a JSON object with at least the `project` and `build` sections")
	)]
	ConfigEmpty(String),

	#[error("config file `{path}` is missing the required `{module}` section")]
	#[diagnostic(
		code(texbook::missing_config_module),
		help(
			"required sections: project, build, files, page_layout, typography, code_style, \
			 table_of_contents"
		)
	)]
	MissingConfigModule { path: String, module: String },

	#[error("invalid config value at `{key}`: {reason}")]
	#[diagnostic(code(texbook::invalid_config))]
	InvalidConfig { key: String, reason: String },

	#[error("failed to load template `{path}`: {reason}")]
	#[diagnostic(
		code(texbook::template_load),
		help("run `texbook templates` to list the templates in this project")
	)]
	TemplateLoad { path: String, reason: String },

	#[error("template `{path}` failed validation: {}", messages.join("; "))]
	#[diagnostic(
		code(texbook::invalid_template),
		help("run `texbook validate` for details and `texbook placeholders` for the known tokens")
	)]
	InvalidTemplate { path: String, messages: Vec<String> },

	#[error("source directory `{0}` does not exist")]
	#[diagnostic(
		code(texbook::missing_source_directory),
		help("set `build.template_dir` to the directory holding your code files")
	)]
	MissingSourceDirectory(String),

	#[error("document compiler `{program}` was not found")]
	#[diagnostic(
		code(texbook::compiler_not_found),
		help("install a TeX distribution that ships `{program}` and make sure it is on PATH")
	)]
	CompilerNotFound { program: String },

	#[error("document compiler `{program}` did not finish within {seconds} seconds")]
	#[diagnostic(
		code(texbook::compile_timeout),
		help("raise `build.timeout_seconds` or check the document for input prompts")
	)]
	CompileTimeout { program: String, seconds: u64 },

	#[error("compiling `{path}` failed with exit code {exit_code}")]
	#[diagnostic(code(texbook::compile_failed))]
	CompileFailed { path: String, exit_code: i32 },

	#[error("failed to write `{path}`: {reason}")]
	#[diagnostic(code(texbook::output_write))]
	OutputWrite { path: String, reason: String },
}

pub type TexbookResult<T> = Result<T, TexbookError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
