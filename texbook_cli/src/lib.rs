use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn a directory of source files into a printable LaTeX code book.",
	long_about = "texbook walks a directory of code files, fills a LaTeX template with the \
	              listings and the values from `config.json`, and compiles the result with \
	              xelatex.\n\nQuick start:\n  texbook sample      Create a starter template\n  \
	              texbook validate    Check the template placeholders\n  texbook generate    \
	              Write build/<name>.tex\n  texbook build       Generate and compile the PDF\n  \
	              texbook status      Show what the project looks like"
)]
pub struct TexbookCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Path to the configuration file. Defaults to `config.json` in the
	/// project root.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Generate the LaTeX source and compile it into a PDF.
	///
	/// Writes `build/<output_filename>.tex`, runs the configured compiler
	/// the configured number of times, moves the PDF into `output/` and
	/// removes auxiliary files when `build.clean_after_build` is set. Exits
	/// with status 1 when compilation fails.
	Build {
		/// Override `build.output_filename` for this run.
		#[arg(long, short)]
		output: Option<String>,

		/// Override `build.template_dir`, the directory holding the code
		/// files.
		#[arg(long)]
		template_dir: Option<String>,

		/// Only write the `.tex` file and skip compilation.
		#[arg(long, default_value_t = false)]
		no_compile: bool,
	},
	/// Write the LaTeX source without compiling it.
	///
	/// Use `--diff` to see how the new source differs from the file already
	/// on disk, or `--watch` to regenerate whenever a code file, template or
	/// the config changes.
	Generate {
		/// Show a diff against the previously generated source.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Watch for file changes and regenerate automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Check a template's placeholders against the known set.
	///
	/// Reports placeholders the template uses that have no value and whether
	/// the content placeholder is present. Exits with status 1 when the
	/// template is invalid.
	Validate {
		/// Template file to check. Defaults to the project's configured
		/// template.
		#[arg(long, short)]
		template: Option<PathBuf>,

		/// Output format for the validation result.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List every placeholder with its value for the current configuration.
	Placeholders,
	/// List the templates in the project's `templates` directory.
	Templates,
	/// Create a minimal template to start from.
	///
	/// The file is written to the `templates` directory and is never
	/// overwritten.
	Sample {
		/// File name of the new template.
		#[arg(long, short, default_value = "sample_template.tex")]
		name: String,
	},
	/// Print a summary of the project.
	Status {
		/// Output format for the summary.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Remove LaTeX auxiliary files from the build directory.
	Clean,
	/// Read, change or check the configuration file.
	#[command(subcommand)]
	Config(ConfigCommand),
}

#[derive(Subcommand)]
pub enum ConfigCommand {
	/// Print the value at a dotted key such as `build.layout`.
	Get {
		/// Dotted key to read.
		key: String,
	},
	/// Set the value at a dotted key and save the file.
	///
	/// Values that parse as JSON (`true`, `12`, `[".cpp"]`) are stored as
	/// such, anything else is stored as a string.
	Set {
		/// Dotted key to write.
		key: String,
		/// New value.
		value: String,
	},
	/// Validate the configuration file and print any warnings.
	Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
