use std::fmt;
use std::str::FromStr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::FontSize;
use crate::TexbookError;
use crate::TexbookResult;

/// Name of the config file looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Top level sections every config file has to declare, even if empty.
pub const REQUIRED_MODULES: [&str; 7] = [
	"project",
	"build",
	"files",
	"page_layout",
	"typography",
	"code_style",
	"table_of_contents",
];

/// The raw JSON config document as it exists on disk.
///
/// This is the only place where dotted keys like
/// `code_style.appearance.font_size` are understood. Everything past the load
/// boundary works with the typed [`BookConfig`] returned by
/// [`ConfigDocument::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
	path: Option<PathBuf>,
	value: Value,
}

impl ConfigDocument {
	/// Read and parse the config file at `path`.
	pub fn load(path: &Path) -> TexbookResult<Self> {
		let display = path.display().to_string();
		let content = std::fs::read_to_string(path).map_err(|e| {
			TexbookError::ConfigRead {
				path: display.clone(),
				reason: e.to_string(),
			}
		})?;
		let value: Value = serde_json::from_str(&content).map_err(|e| {
			TexbookError::ConfigParse {
				path: display.clone(),
				reason: e.to_string(),
			}
		})?;

		let is_empty = match &value {
			Value::Null => true,
			Value::Object(map) => map.is_empty(),
			_ => false,
		};
		if is_empty {
			return Err(TexbookError::ConfigEmpty(display));
		}
		if !value.is_object() {
			return Err(TexbookError::ConfigParse {
				path: display,
				reason: "the top level value must be an object".to_string(),
			});
		}

		tracing::debug!(path = %path.display(), "loaded config");

		Ok(Self {
			path: Some(path.to_path_buf()),
			value,
		})
	}

	/// Wrap an in-memory JSON value. The document has no path and can't be
	/// saved.
	pub fn from_value(value: Value) -> Self {
		Self { path: None, value }
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Look up a dotted key, e.g. `build.layout`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		key.split('.')
			.try_fold(&self.value, |value, part| value.get(part))
	}

	/// Set a dotted key, creating intermediate objects as needed. Intermediate
	/// values that aren't objects are replaced.
	pub fn set(&mut self, key: &str, value: Value) {
		let parts: Vec<&str> = key.split('.').collect();
		set_path(&mut self.value, &parts, value);
	}

	/// Apply in-memory overrides on top of the loaded document. The file on
	/// disk is left untouched unless [`ConfigDocument::save`] is called.
	pub fn apply_overrides<'a>(&mut self, overrides: impl IntoIterator<Item = (&'a str, Value)>) {
		for (key, value) in overrides {
			tracing::debug!(key, %value, "config override");
			self.set(key, value);
		}
	}

	/// Write the document back to the file it was loaded from.
	pub fn save(&self) -> TexbookResult<()> {
		let Some(path) = &self.path else {
			return Err(TexbookError::OutputWrite {
				path: "<memory>".to_string(),
				reason: "the config document was not loaded from a file".to_string(),
			});
		};

		self.save_to(path)
	}

	/// Write the document as pretty printed JSON to `path`.
	pub fn save_to(&self, path: &Path) -> TexbookResult<()> {
		let mut content =
			serde_json::to_string_pretty(&self.value).map_err(|e| {
				TexbookError::OutputWrite {
					path: path.display().to_string(),
					reason: e.to_string(),
				}
			})?;
		content.push('\n');

		std::fs::write(path, content).map_err(|e| {
			TexbookError::OutputWrite {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})
	}

	/// Fail with [`TexbookError::MissingConfigModule`] for the first required
	/// section that isn't present.
	pub fn check_required_modules(&self) -> TexbookResult<()> {
		for module in REQUIRED_MODULES {
			if self.value.get(module).is_none() {
				return Err(TexbookError::MissingConfigModule {
					path: self.display_path(),
					module: module.to_string(),
				});
			}
		}

		Ok(())
	}

	/// Merge the document over the built-in defaults into a typed config.
	pub fn resolve(&self) -> TexbookResult<BookConfig> {
		Ok(BookConfig {
			project: self.section("project")?,
			build: self.section("build")?,
			files: self.section("files")?,
			page_layout: self.section("page_layout")?,
			typography: self.section("typography")?,
			code_style: self.section("code_style")?,
			spacing: self.section("spacing")?,
			table_of_contents: self.section("table_of_contents")?,
			title_page_content: self.section("title_page_content")?,
		})
	}

	/// Run every structural check and return the non-fatal warnings.
	pub fn validate(&self) -> TexbookResult<Vec<String>> {
		self.check_required_modules()?;
		let config = self.resolve()?;
		let mut warnings = config.validate()?;

		if let Some(layout) = self.get("build.layout").and_then(Value::as_str) {
			if layout != "landscape" && layout != "portrait" {
				let warning = format!("build.layout `{layout}` is not recognised, using portrait");
				tracing::debug!("{warning}");
				warnings.push(warning);
			}
		}

		let has_text = |key: &str| {
			self.get(key)
				.and_then(Value::as_str)
				.is_some_and(|text| !text.trim().is_empty())
		};
		if !has_text("project.title") || !has_text("project.author") {
			let warning = "project.title and project.author should both be set".to_string();
			tracing::debug!("{warning}");
			warnings.push(warning);
		}

		Ok(warnings)
	}

	fn section<T: DeserializeOwned + Default>(&self, name: &str) -> TexbookResult<T> {
		match self.value.get(name) {
			None | Some(Value::Null) => Ok(T::default()),
			Some(value) => {
				serde_path_to_error::deserialize(value).map_err(|e| {
					let path = e.path().to_string();
					let key = if path == "." {
						name.to_string()
					} else {
						format!("{name}.{path}")
					};

					TexbookError::InvalidConfig {
						key,
						reason: e.into_inner().to_string(),
					}
				})
			}
		}
	}

	fn display_path(&self) -> String {
		self.path.as_ref().map_or_else(
			|| "<memory>".to_string(),
			|path| path.display().to_string(),
		)
	}
}

impl Default for ConfigDocument {
	fn default() -> Self {
		Self::from_value(Value::Object(Map::new()))
	}
}

fn set_path(target: &mut Value, parts: &[&str], value: Value) {
	let Some((first, rest)) = parts.split_first() else {
		*target = value;
		return;
	};

	if !target.is_object() {
		*target = Value::Object(Map::new());
	}

	if let Value::Object(map) = target {
		let entry = map.entry((*first).to_string()).or_insert(Value::Null);
		set_path(entry, rest, value);
	}
}

/// Interpret a value typed on the command line. Valid JSON (`true`, `12`,
/// `["a"]`) is kept as is and anything else becomes a string.
pub fn parse_override_value(raw: &str) -> Value {
	serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Accept either a JSON string or a JSON number for settings that older
/// config files wrote both ways.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum StringOrNumber {
		String(String),
		Number(serde_json::Number),
	}

	Ok(match StringOrNumber::deserialize(deserializer)? {
		StringOrNumber::String(text) => text,
		StringOrNumber::Number(number) => number.to_string(),
	})
}

/// The numeric counterpart of [`string_or_number`]: accept `3` or `"3"`.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr + Deserialize<'de>,
	T::Err: fmt::Display,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum NumberOrString<T> {
		Number(T),
		String(String),
	}

	match NumberOrString::<T>::deserialize(deserializer)? {
		NumberOrString::Number(number) => Ok(number),
		NumberOrString::String(text) => {
			text.trim()
				.parse()
				.map_err(|e| serde::de::Error::custom(format!("`{text}` is not a number: {e}")))
		}
	}
}

/// Document layout mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum LayoutMode {
	/// Dense landscape pages with two text columns.
	#[default]
	Landscape,
	/// Plain single column portrait pages.
	Portrait,
}

impl LayoutMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Landscape => "landscape",
			Self::Portrait => "portrait",
		}
	}

	/// Whether the body is typeset in multiple columns.
	pub fn is_dense(self) -> bool {
		self == Self::Landscape
	}
}

impl From<String> for LayoutMode {
	fn from(value: String) -> Self {
		if value == "landscape" {
			Self::Landscape
		} else {
			Self::Portrait
		}
	}
}

impl From<LayoutMode> for String {
	fn from(value: LayoutMode) -> Self {
		value.as_str().to_string()
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Fully resolved configuration for one generation run.
///
/// Every section falls back to its defaults when absent, so
/// `BookConfig::default()` is the configuration of an empty `{}` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookConfig {
	pub project: ProjectConfig,
	pub build: BuildConfig,
	pub files: FilesConfig,
	pub page_layout: PageLayoutConfig,
	pub typography: TypographyConfig,
	pub code_style: CodeStyleConfig,
	pub spacing: SpacingConfig,
	pub table_of_contents: TocConfig,
	pub title_page_content: TitlePageConfig,
}

impl BookConfig {
	pub fn layout(&self) -> LayoutMode {
		self.build.layout
	}

	/// Check the resolved values. Problems that make generation impossible are
	/// errors, everything else is returned as a warning.
	pub fn validate(&self) -> TexbookResult<Vec<String>> {
		if self.files.supported_extensions.is_empty() {
			return Err(TexbookError::InvalidConfig {
				key: "files.supported_extensions".to_string(),
				reason: "must be a non-empty list".to_string(),
			});
		}

		let mut warnings = Vec::new();
		let font_size = &self.code_style.appearance.font_size;
		if !FontSize::is_valid(font_size) {
			let warning =
				format!("code_style.appearance.font_size `{font_size}` may not be a valid size");
			tracing::debug!("{warning}");
			warnings.push(warning);
		}

		Ok(warnings)
	}
}

/// Document metadata.
///
/// ```json
/// "project": { "title": "ACM Templates", "author": "Team", "subtitle": "", "date": "" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
	pub title: String,
	pub author: String,
	pub subtitle: String,
	pub date: String,
}

impl Default for ProjectConfig {
	fn default() -> Self {
		Self {
			title: "ACM Templates".to_string(),
			author: "Anonymous".to_string(),
			subtitle: "Compiled: \\today".to_string(),
			date: String::new(),
		}
	}
}

/// Build pipeline settings.
///
/// ```json
/// "build": {
///   "layout": "landscape",
///   "template_dir": "src",
///   "output_filename": "ACM_Templates",
///   "template_name": "unified_template.tex",
///   "use_unified_template": true,
///   "clean_after_build": true,
///   "compiler": "xelatex",
///   "passes": 2,
///   "timeout_seconds": 300
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
	pub layout: LayoutMode,
	/// Directory with the code files, relative to the project root.
	pub template_dir: String,
	/// File stem of the generated `.tex` and `.pdf` files.
	pub output_filename: String,
	/// Template file name inside the `templates` directory.
	pub template_name: String,
	/// Use `{{TOKEN}}` templates. When `false` the older
	/// `<layout>_template.tex` files with a single insertion marker are used.
	pub use_unified_template: bool,
	pub clean_after_build: bool,
	pub compiler: String,
	#[serde(deserialize_with = "number_or_string")]
	pub passes: u32,
	/// Seconds a single compiler pass may run before it is killed.
	#[serde(deserialize_with = "number_or_string")]
	pub timeout_seconds: u64,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			layout: LayoutMode::default(),
			template_dir: "src".to_string(),
			output_filename: "ACM_Templates".to_string(),
			template_name: crate::DEFAULT_TEMPLATE_NAME.to_string(),
			use_unified_template: true,
			clean_after_build: true,
			compiler: "xelatex".to_string(),
			passes: 2,
			timeout_seconds: 300,
		}
	}
}

/// Which files end up in the book.
///
/// ```json
/// "files": {
///   "supported_extensions": [".cpp", ".h"],
///   "exclude_patterns": ["*.tmp", "draft*", "backup"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
	/// Extensions to list, with or without the leading dot. Matching ignores
	/// case.
	pub supported_extensions: Vec<String>,
	/// `*suffix`, `prefix*` or plain substring patterns, matched against file
	/// and directory names only.
	pub exclude_patterns: Vec<String>,
	/// How many leading lines are searched for a description comment.
	#[serde(deserialize_with = "number_or_string")]
	pub description_scan_lines: usize,
	/// How many comment lines are kept for the description.
	#[serde(deserialize_with = "number_or_string")]
	pub description_max_lines: usize,
}

impl Default for FilesConfig {
	fn default() -> Self {
		Self {
			supported_extensions: vec![".cpp".to_string()],
			exclude_patterns: Vec::new(),
			description_scan_lines: 15,
			description_max_lines: 2,
		}
	}
}

/// Page geometry.
///
/// ```json
/// "page_layout": {
///   "margins": { "landscape": { "left": "1cm" }, "portrait": { "top": "2.5cm" } },
///   "column_separation": "1cm"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageLayoutConfig {
	pub margins: LayoutMargins,
	/// Gap between the two text columns of the landscape layout.
	pub column_separation: String,
}

impl Default for PageLayoutConfig {
	fn default() -> Self {
		Self {
			margins: LayoutMargins::default(),
			column_separation: "1cm".to_string(),
		}
	}
}

impl PageLayoutConfig {
	pub fn margins_for(&self, layout: LayoutMode) -> &Margins {
		match layout {
			LayoutMode::Landscape => &self.margins.landscape,
			LayoutMode::Portrait => &self.margins.portrait,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutMargins {
	pub landscape: Margins,
	pub portrait: Margins,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Margins {
	pub left: String,
	pub right: String,
	pub top: String,
	pub bottom: String,
}

impl Default for Margins {
	fn default() -> Self {
		Self {
			left: "1.5cm".to_string(),
			right: "1.5cm".to_string(),
			top: "2cm".to_string(),
			bottom: "2cm".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypographyConfig {
	pub fonts: FontsConfig,
	pub colors: ColorsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
	pub main: String,
	pub cjk_main: String,
	pub cjk_bold: String,
	pub cjk_italic: String,
	/// Font family for listings. `Fira Code` gets its own font setup, any
	/// other value uses the default typewriter family.
	pub code: String,
}

impl Default for FontsConfig {
	fn default() -> Self {
		Self {
			main: "Times New Roman".to_string(),
			cjk_main: "SimSun".to_string(),
			cjk_bold: "SimHei".to_string(),
			cjk_italic: "KaiTi".to_string(),
			code: String::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
	pub section: String,
	pub subsection: String,
	pub subsubsection: String,
	pub code_background: String,
	pub code_keyword: String,
	pub code_comment: String,
	pub code_string: String,
	pub code_number: String,
}

impl Default for ColorsConfig {
	fn default() -> Self {
		Self {
			section: "blue!70!black".to_string(),
			subsection: "green!60!black".to_string(),
			subsubsection: "orange!80!black".to_string(),
			code_background: "gray!5".to_string(),
			code_keyword: "blue".to_string(),
			code_comment: "green!50!black".to_string(),
			code_string: "red".to_string(),
			code_number: "gray".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeStyleConfig {
	pub appearance: CodeAppearance,
	pub formatting: CodeFormatting,
	pub spacing: CodeSpacing,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeAppearance {
	pub font_size: String,
	pub frame_style: String,
	pub break_lines: bool,
	pub line_numbers: bool,
}

impl Default for CodeAppearance {
	fn default() -> Self {
		Self {
			font_size: "6pt".to_string(),
			frame_style: "leftline".to_string(),
			break_lines: true,
			line_numbers: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeFormatting {
	#[serde(deserialize_with = "string_or_number")]
	pub tab_size: String,
	/// Extra leading as a fraction of the font size.
	#[serde(deserialize_with = "string_or_number")]
	pub line_spacing: String,
}

impl Default for CodeFormatting {
	fn default() -> Self {
		Self {
			tab_size: "4".to_string(),
			line_spacing: "0.5".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeSpacing {
	pub above_skip: String,
	pub below_skip: String,
}

impl Default for CodeSpacing {
	fn default() -> Self {
		Self {
			above_skip: "3pt".to_string(),
			below_skip: "3pt".to_string(),
		}
	}
}

/// Heading and paragraph spacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
	pub section_before: String,
	pub section_after: String,
	pub subsection_before: String,
	pub subsection_after: String,
	pub subsubsection_before: String,
	pub subsubsection_after: String,
	pub paragraph_skip: String,
	pub paragraph_indent: String,
	pub page_style: String,
	pub header_footer: String,
}

impl Default for SpacingConfig {
	fn default() -> Self {
		Self {
			section_before: "4pt".to_string(),
			section_after: "2pt".to_string(),
			subsection_before: "3pt".to_string(),
			subsection_after: "1.5pt".to_string(),
			subsubsection_before: "2pt".to_string(),
			subsubsection_after: "1pt".to_string(),
			paragraph_skip: "1pt".to_string(),
			paragraph_indent: "0pt".to_string(),
			page_style: "plain".to_string(),
			header_footer: String::new(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocConfig {
	pub structure: TocStructure,
	pub styling: TocStyling,
	pub spacing: TocSpacing,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocStructure {
	#[serde(deserialize_with = "string_or_number")]
	pub depth: String,
	pub font_size: String,
}

impl Default for TocStructure {
	fn default() -> Self {
		Self {
			depth: "3".to_string(),
			font_size: "\\normalsize".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocStyling {
	pub fonts: TocFonts,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocFonts {
	pub section: String,
	pub subsection: String,
	pub subsubsection: String,
}

impl Default for TocFonts {
	fn default() -> Self {
		Self {
			section: "\\footnotesize\\bfseries".to_string(),
			subsection: "\\scriptsize\\bfseries".to_string(),
			subsubsection: "\\tiny".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocSpacing {
	/// A length such as `-1.2cm` or a complete command starting with `\`.
	pub before_toc: String,
	pub after_toc: String,
	pub before_section: String,
	pub before_subsection: String,
	pub before_subsubsection: String,
}

impl Default for TocSpacing {
	fn default() -> Self {
		Self {
			before_toc: "-1.2cm".to_string(),
			after_toc: "-1cm".to_string(),
			before_section: "0.5pt".to_string(),
			before_subsection: "0.2pt".to_string(),
			before_subsubsection: "0pt".to_string(),
		}
	}
}

/// Extra text shown on the title page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TitlePageConfig {
	pub enabled: bool,
	pub description: String,
}

impl Default for TitlePageConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			description: "This document collects commonly used ACM templates.".to_string(),
		}
	}
}
