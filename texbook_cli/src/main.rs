use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use serde_json::Value;
use similar::ChangeTag;
use similar::TextDiff;
use texbook_cli::Commands;
use texbook_cli::ConfigCommand;
use texbook_cli::OutputFormat;
use texbook_cli::TexbookCli;
use texbook_core::BookProject;
use texbook_core::CONTENT_TOKEN;
use texbook_core::ConfigDocument;
use texbook_core::DEFAULT_CONFIG_FILE;
use texbook_core::DocumentCompiler;
use texbook_core::TemplateProcessor;
use texbook_core::TemplateSource;
use texbook_core::TexbookError;
use texbook_core::TokenTable;
use texbook_core::has_legacy_marker;
use texbook_core::parse_override_value;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter, e.g. `texbook_core=debug`.
const LOG_ENV: &str = "TEXBOOK_LOG";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TexbookCli::parse();

	// Respect NO_COLOR, --no-color and terminals without color support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Build {
			output,
			template_dir,
			no_compile,
		}) => {
			run_build(
				&args,
				output.as_deref(),
				template_dir.as_deref(),
				*no_compile,
			)
		}
		Some(Commands::Generate { diff, watch }) => run_generate(&args, *diff, *watch),
		Some(Commands::Validate { template, format }) => {
			run_validate(&args, template.as_deref(), *format)
		}
		Some(Commands::Placeholders) => run_placeholders(&args),
		Some(Commands::Templates) => run_templates(&args),
		Some(Commands::Sample { name }) => run_sample(&args, name),
		Some(Commands::Status { format }) => run_status(&args, *format),
		Some(Commands::Clean) => run_clean(&args),
		Some(Commands::Config(command)) => run_config(&args, command),
		None => {
			eprintln!("No subcommand specified. Run `texbook --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<TexbookError>() {
			Ok(texbook_err) => {
				let report: miette::Report = (*texbook_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `TEXBOOK_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_filter = if verbose {
		"warn,texbook_core=debug"
	} else {
		"warn"
	};
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(verbose)
		.without_time()
		.init();
}

fn resolve_root(args: &TexbookCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn config_path(args: &TexbookCli) -> PathBuf {
	args.config
		.clone()
		.unwrap_or_else(|| resolve_root(args).join(DEFAULT_CONFIG_FILE))
}

fn open_project(
	args: &TexbookCli,
	overrides: Vec<(&str, Value)>,
) -> Result<BookProject, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let mut document = ConfigDocument::load(&config_path(args))?;
	document.apply_overrides(overrides);

	Ok(BookProject::from_document(&root, document)?)
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<28} {value}");
}

fn run_build(
	args: &TexbookCli,
	output: Option<&str>,
	template_dir: Option<&str>,
	no_compile: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let mut overrides = Vec::new();
	if let Some(output) = output {
		overrides.push(("build.output_filename", Value::String(output.to_string())));
	}
	if let Some(template_dir) = template_dir {
		overrides.push(("build.template_dir", Value::String(template_dir.to_string())));
	}

	let project = open_project(args, overrides)?;
	let root = project.root();

	if no_compile {
		let (tex_path, generated) = project.write_source()?;
		println!(
			"Wrote {} ({} listing(s)).",
			make_relative(&tex_path, root),
			generated.listings
		);
		return Ok(());
	}

	let compiler = project.compiler();
	let outcome = project.build(&compiler)?;
	println!("Wrote {}.", make_relative(&outcome.tex_path, root));

	if !outcome.report.success {
		let report: miette::Report = TexbookError::CompileFailed {
			path: make_relative(&outcome.tex_path, root),
			exit_code: outcome.report.exit_code,
		}
		.into();
		eprintln!("{report:?}");
		for line in &outcome.report.diagnostics {
			eprintln!("  {line}");
		}
		process::exit(1);
	}

	match &outcome.pdf_path {
		Some(pdf_path) => {
			println!(
				"{} {}",
				colored!("Built", green),
				make_relative(pdf_path, root)
			);
		}
		None => {
			eprintln!(
				"{} {} reported success but produced no PDF",
				colored!("warning:", yellow),
				compiler.program()
			);
		}
	}

	if args.verbose {
		println!("Removed {} auxiliary file(s).", outcome.cleaned.len());
		for path in &outcome.cleaned {
			println!("  {}", make_relative(path, root));
		}
	}

	Ok(())
}

fn run_generate(
	args: &TexbookCli,
	show_diff: bool,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial generation.
	run_generate_once(args, show_diff)?;

	if !watch {
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let project = open_project(args, Vec::new())?;
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	// The build directory is never watched since generation writes to it.
	let mut watched = vec![(project.source_dir(), notify::RecursiveMode::Recursive)];
	if project.templates_dir().is_dir() {
		watched.push((project.templates_dir(), notify::RecursiveMode::Recursive));
	}
	if let Some(config) = project.document().path() {
		watched.push((config.to_path_buf(), notify::RecursiveMode::NonRecursive));
	}
	for (path, mode) in &watched {
		tracing::debug!(path = %path.display(), "watching");
		watcher.watch(path, *mode)?;
	}

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, regenerating...");
		if let Err(e) = run_generate_once(args, show_diff) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn run_generate_once(args: &TexbookCli, show_diff: bool) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let previous = std::fs::read_to_string(project.tex_path()).ok();
	let (tex_path, generated) = project.write_source()?;
	let rel = make_relative(&tex_path, project.root());

	match previous {
		Some(previous) if previous == generated.text => {
			println!("{rel} is already up to date.");
		}
		Some(previous) => {
			println!("Updated {rel} ({} listing(s)).", generated.listings);
			if show_diff {
				print_diff(&previous, &generated.text);
			}
		}
		None => {
			println!("Created {rel} ({} listing(s)).", generated.listings);
		}
	}

	if args.verbose {
		println!("  template: {}", generated.template);
	}

	Ok(())
}

fn run_validate(
	args: &TexbookCli,
	template: Option<&Path>,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let mut processor = TemplateProcessor::new(project.config());

	let (text, source) = match template {
		Some(path) => {
			(
				processor.load(path)?.to_string(),
				TemplateSource::File(path.to_path_buf()),
			)
		}
		None => project.load_template(&mut processor)?,
	};

	if template.is_none() && !project.config().build.use_unified_template {
		if has_legacy_marker(&text) {
			println!("Legacy template {source} has an insertion marker.");
			return Ok(());
		}
		eprintln!(
			"{} legacy template {source} has no insertion marker",
			colored!("error:", red)
		);
		process::exit(1);
	}

	let result = processor.validate(&text);

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&result)?);
		}
		OutputFormat::Text => {
			print_field("Template", &source);
			print_field("Placeholders used", result.found.len());
			print_field("Placeholders available", result.available.len());

			if result.valid {
				println!("{}", colored!("Template is valid.", green));
			} else {
				for message in &result.messages {
					eprintln!("{} {message}", colored!("error:", red));
				}
			}
		}
	}

	if !result.valid {
		process::exit(1);
	}

	Ok(())
}

fn run_placeholders(args: &TexbookCli) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let table = TokenTable::from_config(project.config());

	for (name, value) in &*table {
		println!("{name:<30} {}", value.replace('\n', "\\n"));
	}
	println!("{CONTENT_TOKEN:<30} (generated listings)");

	if args.verbose {
		println!("\n{} placeholder(s)", table.len() + 1);
	}

	Ok(())
}

fn run_templates(args: &TexbookCli) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let root = project.root();
	let templates = project.templates()?;
	let active = project.template_path();

	if templates.is_empty() {
		println!(
			"No templates found in {}. The built in template is used.",
			make_relative(&project.templates_dir(), root)
		);
		return Ok(());
	}

	println!("{}", colored!("Templates:", bold));
	for path in &templates {
		let marker = if *path == active { " (active)" } else { "" };
		println!("  {}{marker}", make_relative(path, root));
	}

	Ok(())
}

fn run_sample(args: &TexbookCli, name: &str) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let target = project.templates_dir().join(name);

	if target.exists() {
		println!("Template file already exists: {}", target.display());
		return Ok(());
	}

	let path = project.create_sample_template(name)?;
	println!("Created template file: {}", path.display());
	println!();
	println!("Next steps:");
	println!("  1. Edit {} and add placeholders", path.display());
	println!("  2. Set `build.template_name` to `{name}` in config.json");
	println!("  3. Run `texbook validate` to check it");

	Ok(())
}

fn run_status(args: &TexbookCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let status = project.status();

	if format == OutputFormat::Json {
		println!("{}", serde_json::to_string_pretty(&status)?);
		return Ok(());
	}

	let root = project.root();
	let exists = |flag: bool| if flag { "present" } else { "missing" };
	let config = project
		.document()
		.path()
		.map_or_else(|| "none".to_string(), |path| path.display().to_string());

	println!("{}", colored!("texbook status", bold));

	print_section("Project");
	print_field("Project root", root.display());
	print_field("Config file", config);
	print_field("Layout", status.layout);
	print_field("Code font size", &status.code_font_size);

	print_section("Sources");
	print_field(
		"Source directory",
		format!(
			"{} ({})",
			make_relative(&status.source_dir, root),
			exists(status.source_dir_exists)
		),
	);
	print_field("Listed files", status.source_files);

	print_section("Template");
	print_field("Template", &status.template);
	print_field(
		"Mode",
		if status.use_unified_template {
			"unified"
		} else {
			"legacy"
		},
	);

	print_section("Compiler");
	print_field(
		"Compiler",
		format!(
			"{} ({})",
			status.compiler,
			if status.compiler_available {
				"available"
			} else {
				"not found"
			}
		),
	);

	print_section("Output");
	print_field(
		"Generated source",
		format!(
			"{} ({})",
			make_relative(&status.tex_path, root),
			exists(status.tex_exists)
		),
	);
	print_field(
		"PDF",
		format!(
			"{} ({})",
			make_relative(&status.pdf_path, root),
			exists(status.pdf_exists)
		),
	);

	Ok(())
}

fn run_clean(args: &TexbookCli) -> Result<(), Box<dyn std::error::Error>> {
	let project = open_project(args, Vec::new())?;
	let removed = project.clean()?;

	if removed.is_empty() {
		println!("No auxiliary files to remove.");
		return Ok(());
	}

	println!("Removed {} auxiliary file(s).", removed.len());
	if args.verbose {
		for path in &removed {
			println!("  {}", make_relative(path, project.root()));
		}
	}

	Ok(())
}

fn run_config(args: &TexbookCli, command: &ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
	let path = config_path(args);

	match command {
		ConfigCommand::Get { key } => {
			let document = ConfigDocument::load(&path)?;
			match document.get(key) {
				Some(Value::String(text)) => println!("{text}"),
				Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
				None => return Err(format!("config key `{key}` is not set").into()),
			}
		}
		ConfigCommand::Set { key, value } => {
			let mut document = ConfigDocument::load(&path)?;
			let value = parse_override_value(value);
			document.set(key, value.clone());
			document.save()?;
			println!("Set {key} = {value}");
		}
		ConfigCommand::Check => {
			let document = ConfigDocument::load(&path)?;
			let warnings = document.validate()?;
			for warning in &warnings {
				println!("{} {warning}", colored!("warning:", yellow));
			}
			println!("Configuration is valid.");
		}
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
