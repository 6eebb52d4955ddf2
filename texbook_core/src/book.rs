use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::BUILTIN_LEGACY_TEMPLATE;
use crate::BUILTIN_TEMPLATE;
use crate::BookConfig;
use crate::CompileReport;
use crate::ConfigDocument;
use crate::ContentFragment;
use crate::DEFAULT_CONFIG_FILE;
use crate::DEFAULT_TEMPLATE_NAME;
use crate::DocumentCompiler;
use crate::LayoutMode;
use crate::SAMPLE_TEMPLATE;
use crate::TemplateProcessor;
use crate::TexbookError;
use crate::TexbookResult;
use crate::TreeWalker;
use crate::XelatexCompiler;
use crate::clean_auxiliary_files;
use crate::legacy_template_name;
use crate::list_templates;

/// Directory holding the document templates, relative to the project root.
pub const TEMPLATES_DIR: &str = "templates";
/// Directory the generated `.tex` file and compiler scratch files go to.
pub const BUILD_DIR: &str = "build";
/// Directory the finished PDF is moved to.
pub const OUTPUT_DIR: &str = "output";

/// A code book project on disk.
///
/// ```text
/// <root>/
///   config.json
///   templates/unified_template.tex
///   src/            (build.template_dir)
///   build/<output_filename>.tex
///   output/<output_filename>.pdf
/// ```
#[derive(Debug, Clone)]
pub struct BookProject {
	root: PathBuf,
	document: ConfigDocument,
	config: BookConfig,
}

/// Which template a generation run used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
	/// A template file in the project.
	File(PathBuf),
	/// The template bundled with texbook.
	Builtin(&'static str),
}

impl std::fmt::Display for TemplateSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::File(path) => write!(f, "{}", path.display()),
			Self::Builtin(name) => write!(f, "{name} (built in)"),
		}
	}
}

/// Generated LaTeX source together with what went into it.
#[derive(Debug, Clone)]
pub struct GeneratedSource {
	pub text: String,
	pub template: TemplateSource,
	pub listings: usize,
}

/// Everything `build` produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
	pub tex_path: PathBuf,
	pub report: CompileReport,
	/// Final PDF location when compilation succeeded.
	pub pdf_path: Option<PathBuf>,
	/// Auxiliary files removed after the build.
	pub cleaned: Vec<PathBuf>,
}

/// Summary for `texbook status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
	pub root: PathBuf,
	pub source_dir: PathBuf,
	pub source_dir_exists: bool,
	pub source_files: usize,
	pub template: String,
	pub use_unified_template: bool,
	pub compiler: String,
	pub compiler_available: bool,
	pub layout: LayoutMode,
	pub code_font_size: String,
	pub tex_path: PathBuf,
	pub tex_exists: bool,
	pub pdf_path: PathBuf,
	pub pdf_exists: bool,
}

impl BookProject {
	/// Load `config.json` from `root` (or the explicit `config_path`) and
	/// resolve it.
	pub fn open(root: &Path, config_path: Option<&Path>) -> TexbookResult<Self> {
		let config_path = config_path.map_or_else(|| root.join(DEFAULT_CONFIG_FILE), Path::to_path_buf);
		let document = ConfigDocument::load(&config_path)?;

		Self::from_document(root, document)
	}

	/// Use an already loaded (and possibly overridden) config document.
	pub fn from_document(root: &Path, document: ConfigDocument) -> TexbookResult<Self> {
		document.check_required_modules()?;
		let config = document.resolve()?;
		config.validate()?;

		Ok(Self {
			root: root.to_path_buf(),
			document,
			config,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn config(&self) -> &BookConfig {
		&self.config
	}

	pub fn document(&self) -> &ConfigDocument {
		&self.document
	}

	pub fn templates_dir(&self) -> PathBuf {
		self.root.join(TEMPLATES_DIR)
	}

	pub fn source_dir(&self) -> PathBuf {
		self.root.join(&self.config.build.template_dir)
	}

	pub fn build_dir(&self) -> PathBuf {
		self.root.join(BUILD_DIR)
	}

	pub fn output_dir(&self) -> PathBuf {
		self.root.join(OUTPUT_DIR)
	}

	pub fn tex_path(&self) -> PathBuf {
		self.build_dir()
			.join(format!("{}.tex", self.config.build.output_filename))
	}

	pub fn pdf_path(&self) -> PathBuf {
		self.output_dir()
			.join(format!("{}.pdf", self.config.build.output_filename))
	}

	/// The configured template name for the active mode.
	pub fn template_name(&self) -> String {
		if self.config.build.use_unified_template {
			self.config.build.template_name.clone()
		} else {
			legacy_template_name(self.config.layout())
		}
	}

	pub fn template_path(&self) -> PathBuf {
		self.templates_dir().join(self.template_name())
	}

	/// Walk the source directory into a content fragment.
	pub fn walk(&self) -> TexbookResult<ContentFragment> {
		let source_dir = self.source_dir();
		if !source_dir.is_dir() {
			return Err(TexbookError::MissingSourceDirectory(
				source_dir.display().to_string(),
			));
		}

		tracing::info!(path = %source_dir.display(), "walking source directory");
		Ok(TreeWalker::new(&self.config).walk(&source_dir, 1))
	}

	/// Read the template for this run. The bundled templates stand in for the
	/// default names when the project doesn't provide them.
	pub fn load_template(
		&self,
		processor: &mut TemplateProcessor<'_>,
	) -> TexbookResult<(String, TemplateSource)> {
		let path = self.template_path();

		if !path.exists() {
			let unified = self.config.build.use_unified_template;
			if unified && self.config.build.template_name == DEFAULT_TEMPLATE_NAME {
				tracing::info!(path = %path.display(), "using the built in template");
				return Ok((
					BUILTIN_TEMPLATE.to_string(),
					TemplateSource::Builtin(DEFAULT_TEMPLATE_NAME),
				));
			}
			if !unified {
				tracing::info!(path = %path.display(), "using the built in legacy template");
				return Ok((
					BUILTIN_LEGACY_TEMPLATE.to_string(),
					TemplateSource::Builtin("legacy_template.tex"),
				));
			}
		}

		let text = processor.load(&path)?.to_string();
		Ok((text, TemplateSource::File(path)))
	}

	/// Produce the complete LaTeX source.
	///
	/// Unified templates are validated first and generation is refused when
	/// they reference unknown placeholders or lack the content placeholder.
	pub fn generate(&self) -> TexbookResult<GeneratedSource> {
		let fragment = self.walk()?;
		let body = fragment.render(self.config.layout());
		let listings = fragment.listings().count();

		let mut processor = TemplateProcessor::new(&self.config);
		let (template, source) = self.load_template(&mut processor)?;

		let text = if self.config.build.use_unified_template {
			let validation = processor.validate(&template);
			if !validation.valid {
				return Err(TexbookError::InvalidTemplate {
					path: source.to_string(),
					messages: validation.messages,
				});
			}
			processor.process(&template, &body)
		} else {
			processor.insert_legacy(&template, &body)
		};

		tracing::info!(listings, template = %source, "generated document source");

		Ok(GeneratedSource {
			text,
			template: source,
			listings,
		})
	}

	/// Generate the source and write it to [`BookProject::tex_path`].
	pub fn write_source(&self) -> TexbookResult<(PathBuf, GeneratedSource)> {
		let generated = self.generate()?;
		let tex_path = self.tex_path();

		write_file(&tex_path, &generated.text)?;
		tracing::info!(path = %tex_path.display(), "wrote document source");

		Ok((tex_path, generated))
	}

	/// The configured compiler, writing into the build directory.
	pub fn compiler(&self) -> XelatexCompiler {
		XelatexCompiler::from_config(&self.config.build).with_output_dir(self.build_dir())
	}

	/// Generate, compile, move the PDF into the output directory and clean up
	/// auxiliary files.
	///
	/// The source is written even when the compiler is missing. Auxiliary files
	/// are only removed after a successful compile so the log of a failed run
	/// stays available.
	pub fn build(&self, compiler: &dyn DocumentCompiler) -> TexbookResult<BuildOutcome> {
		let (tex_path, _) = self.write_source()?;

		if !compiler.is_available() {
			return Err(TexbookError::CompilerNotFound {
				program: compiler.program().to_string(),
			});
		}

		let report = compiler.compile(&tex_path)?;

		let pdf_path = if report.success && report.artifact.exists() {
			let pdf_path = self.pdf_path();
			move_file(&report.artifact, &pdf_path)?;
			Some(pdf_path)
		} else {
			None
		};

		let cleaned = if report.success && self.config.build.clean_after_build {
			clean_auxiliary_files(&self.build_dir())?
		} else {
			Vec::new()
		};

		Ok(BuildOutcome {
			tex_path,
			report,
			pdf_path,
			cleaned,
		})
	}

	/// Remove auxiliary files from the build directory.
	pub fn clean(&self) -> TexbookResult<Vec<PathBuf>> {
		clean_auxiliary_files(&self.build_dir())
	}

	/// Templates available in the project's template directory.
	pub fn templates(&self) -> TexbookResult<Vec<PathBuf>> {
		list_templates(&self.templates_dir())
	}

	/// Write a minimal template called `name` to the template directory.
	/// Existing files are never overwritten.
	pub fn create_sample_template(&self, name: &str) -> TexbookResult<PathBuf> {
		let path = self.templates_dir().join(name);
		if path.exists() {
			return Err(TexbookError::OutputWrite {
				path: path.display().to_string(),
				reason: "file already exists".to_string(),
			});
		}

		write_file(&path, SAMPLE_TEMPLATE)?;
		Ok(path)
	}

	pub fn status(&self) -> ProjectStatus {
		let source_dir = self.source_dir();
		let tex_path = self.tex_path();
		let pdf_path = self.pdf_path();

		ProjectStatus {
			root: self.root.clone(),
			source_dir_exists: source_dir.is_dir(),
			source_files: TreeWalker::new(&self.config).count_files(&source_dir),
			source_dir,
			template: self.template_name(),
			use_unified_template: self.config.build.use_unified_template,
			compiler: self.config.build.compiler.clone(),
			compiler_available: self.compiler().is_available(),
			layout: self.config.layout(),
			code_font_size: self.config.code_style.appearance.font_size.clone(),
			tex_exists: tex_path.is_file(),
			tex_path,
			pdf_exists: pdf_path.is_file(),
			pdf_path,
		}
	}
}

fn write_file(path: &Path, content: &str) -> TexbookResult<()> {
	let to_error = |e: std::io::Error| {
		TexbookError::OutputWrite {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	};

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(to_error)?;
	}
	std::fs::write(path, content).map_err(to_error)
}

/// Rename when possible and fall back to copy and delete across file systems.
fn move_file(from: &Path, to: &Path) -> TexbookResult<()> {
	if from == to {
		return Ok(());
	}

	let to_error = |e: std::io::Error| {
		TexbookError::OutputWrite {
			path: to.display().to_string(),
			reason: e.to_string(),
		}
	};

	if let Some(parent) = to.parent() {
		std::fs::create_dir_all(parent).map_err(to_error)?;
	}
	if std::fs::rename(from, to).is_err() {
		std::fs::copy(from, to).map_err(to_error)?;
		std::fs::remove_file(from)?;
	}

	Ok(())
}
