use std::collections::BTreeMap;

use derive_more::Deref;

use crate::BookConfig;
use crate::FontSize;
use crate::LayoutMode;
use crate::escape::format_leading;
use crate::format_size;

/// The token that marks where the generated listings are inserted. Every
/// template has to contain it.
pub const CONTENT_TOKEN: &str = "AUTO_INSERTED_CONTENT";

/// Line height used for code when the configured size or spacing can't be
/// interpreted.
pub const FALLBACK_CODE_LINE_HEIGHT: &str = "7pt";

/// Every token produced by [`TokenTable::from_config`], whatever the
/// configuration. [`CONTENT_TOKEN`] is not part of this list since its value
/// comes from the tree walker.
pub const TOKEN_NAMES: [&str; 59] = [
	// document class
	"DOCUMENT_CLASS_OPTIONS",
	// page
	"PAGE_ORIENTATION",
	"MARGIN_LEFT",
	"MARGIN_RIGHT",
	"MARGIN_TOP",
	"MARGIN_BOTTOM",
	"COLUMN_SEP_OPTION",
	"COLUMN_SEPARATION",
	"COLUMN_RULE_WIDTH",
	// fonts
	"MAIN_FONT",
	"CJK_MAIN_FONT",
	"CJK_BOLD_FONT",
	"CJK_ITALIC_FONT",
	// colors
	"SECTION_COLOR",
	"SUBSECTION_COLOR",
	"SUBSUBSECTION_COLOR",
	"CODE_BACKGROUND_COLOR",
	"CODE_KEYWORD_COLOR",
	"CODE_COMMENT_COLOR",
	"CODE_STRING_COLOR",
	"CODE_NUMBER_COLOR",
	// code style
	"CODE_FONT_SETUP",
	"CODE_BASIC_STYLE",
	"CODE_FONT_SIZE",
	"CODE_LINE_HEIGHT",
	"CODE_FRAME_STYLE",
	"CODE_BREAK_LINES",
	"CODE_TAB_SIZE",
	"CODE_ABOVE_SKIP",
	"CODE_BELOW_SKIP",
	"CODE_NUMBERS_OPTION",
	// layout
	"TITLE_PAGE_LAYOUT",
	"TOC_LAYOUT",
	"MAIN_CONTENT_LAYOUT",
	// metadata
	"DOCUMENT_TITLE",
	"DOCUMENT_AUTHOR",
	"DOCUMENT_SUBTITLE",
	"DOCUMENT_DATE",
	// spacing
	"SECTION_SPACING_BEFORE",
	"SECTION_SPACING_AFTER",
	"SUBSECTION_SPACING_BEFORE",
	"SUBSECTION_SPACING_AFTER",
	"SUBSUBSECTION_SPACING_BEFORE",
	"SUBSUBSECTION_SPACING_AFTER",
	"PARAGRAPH_SKIP",
	"PARAGRAPH_INDENT",
	"TOC_SPACING_BEFORE",
	"TOC_SPACING_AFTER",
	"TOC_DEPTH",
	"TOC_FONT_SIZE",
	"TOC_SEC_SPACING",
	"TOC_SUBSEC_SPACING",
	"TOC_SUBSUBSEC_SPACING",
	"TOC_SEC_FONT",
	"TOC_SUBSEC_FONT",
	"TOC_SUBSUBSEC_FONT",
	"PAGE_STYLE",
	"HEADER_FOOTER_SETTINGS",
	"CUSTOM_TITLE_CONTENT",
];

const FIRA_CODE: &str = "Fira Code";

const FIRA_CODE_SETUP: &str = "% Setup Fira Code for listings\n\\newfontfamily\\firafont[Ligatures=TeX,Contextuals=Alternate]{Fira Code}\n\\newcommand{\\firatextstyle}{\\firafont}";

/// Token name to value, built fresh from a [`BookConfig`] for each run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct TokenTable(BTreeMap<String, String>);

impl TokenTable {
	/// Build the table from the resolved configuration. Every name in
	/// [`TOKEN_NAMES`] is always present.
	pub fn from_config(config: &BookConfig) -> Self {
		let table = document_class_tokens(config)
			.into_iter()
			.chain(page_tokens(config))
			.chain(font_tokens(config))
			.chain(color_tokens(config))
			.chain(code_style_tokens(config))
			.chain(layout_tokens(config))
			.chain(metadata_tokens(config))
			.chain(spacing_tokens(config))
			.map(|(name, value)| (name.to_string(), value))
			.collect();

		Self(table)
	}

	/// Add the generated body under [`CONTENT_TOKEN`].
	#[must_use]
	pub fn with_content(mut self, body: impl Into<String>) -> Self {
		self.0.insert(CONTENT_TOKEN.to_string(), body.into());
		self
	}
}

fn document_class_tokens(config: &BookConfig) -> [(&'static str, String); 1] {
	let options = match config.layout() {
		LayoutMode::Landscape => "10pt,landscape,twocolumn",
		LayoutMode::Portrait => "10pt",
	};

	[("DOCUMENT_CLASS_OPTIONS", options.to_string())]
}

fn page_tokens(config: &BookConfig) -> [(&'static str, String); 8] {
	let layout = config.layout();
	let page = &config.page_layout;
	let margins = page.margins_for(layout);
	let (column_sep_option, column_separation) = if layout.is_dense() {
		(
			format!("columnsep={}", page.column_separation),
			page.column_separation.clone(),
		)
	} else {
		(String::new(), "0cm".to_string())
	};

	[
		("PAGE_ORIENTATION", layout.as_str().to_string()),
		("MARGIN_LEFT", margins.left.clone()),
		("MARGIN_RIGHT", margins.right.clone()),
		("MARGIN_TOP", margins.top.clone()),
		("MARGIN_BOTTOM", margins.bottom.clone()),
		("COLUMN_SEP_OPTION", column_sep_option),
		("COLUMN_SEPARATION", column_separation),
		("COLUMN_RULE_WIDTH", "0pt".to_string()),
	]
}

fn font_tokens(config: &BookConfig) -> [(&'static str, String); 4] {
	let fonts = &config.typography.fonts;

	[
		("MAIN_FONT", fonts.main.clone()),
		("CJK_MAIN_FONT", fonts.cjk_main.clone()),
		("CJK_BOLD_FONT", fonts.cjk_bold.clone()),
		("CJK_ITALIC_FONT", fonts.cjk_italic.clone()),
	]
}

fn color_tokens(config: &BookConfig) -> [(&'static str, String); 8] {
	let colors = &config.typography.colors;

	[
		("SECTION_COLOR", colors.section.clone()),
		("SUBSECTION_COLOR", colors.subsection.clone()),
		("SUBSUBSECTION_COLOR", colors.subsubsection.clone()),
		("CODE_BACKGROUND_COLOR", colors.code_background.clone()),
		("CODE_KEYWORD_COLOR", colors.code_keyword.clone()),
		("CODE_COMMENT_COLOR", colors.code_comment.clone()),
		("CODE_STRING_COLOR", colors.code_string.clone()),
		("CODE_NUMBER_COLOR", colors.code_number.clone()),
	]
}

/// Line height for listings: `size * (1 + line_spacing)`, one decimal.
pub fn code_line_height(font_size: &str, line_spacing: &str) -> String {
	let factor = line_spacing.trim().parse::<f64>().ok();
	let leading = FontSize::parse(font_size)
		.zip(factor)
		.and_then(|(size, factor)| size.leading(factor));

	match leading {
		Some(points) if points.is_finite() => format_leading(points),
		_ => FALLBACK_CODE_LINE_HEIGHT.to_string(),
	}
}

fn code_style_tokens(config: &BookConfig) -> [(&'static str, String); 10] {
	let style = &config.code_style;
	let appearance = &style.appearance;
	let font_size = appearance.font_size.as_str();
	let line_height = code_line_height(font_size, &style.formatting.line_spacing);

	let line_spacing = style.formatting.line_spacing.trim().parse::<f64>().ok();
	let size_directive = format_size(font_size, line_spacing);
	let (font_setup, family) = if config.typography.fonts.code == FIRA_CODE {
		(FIRA_CODE_SETUP, "\\firatextstyle")
	} else {
		("% Using default TTY font", "\\ttfamily")
	};

	[
		("CODE_FONT_SETUP", font_setup.to_string()),
		("CODE_BASIC_STYLE", format!("{family}{size_directive}")),
		("CODE_FONT_SIZE", font_size.to_string()),
		("CODE_LINE_HEIGHT", line_height),
		("CODE_FRAME_STYLE", appearance.frame_style.clone()),
		("CODE_BREAK_LINES", appearance.break_lines.to_string()),
		("CODE_TAB_SIZE", style.formatting.tab_size.clone()),
		("CODE_ABOVE_SKIP", style.spacing.above_skip.clone()),
		("CODE_BELOW_SKIP", style.spacing.below_skip.clone()),
		(
			"CODE_NUMBERS_OPTION",
			if appearance.line_numbers {
				"numbers=left,".to_string()
			} else {
				String::new()
			},
		),
	]
}

fn layout_tokens(config: &BookConfig) -> [(&'static str, String); 3] {
	let (title, toc, body) = match config.layout() {
		LayoutMode::Landscape => ("\\onecolumn", "\\twocolumn", "% two columns"),
		LayoutMode::Portrait => ("% single column", "% single column", "% single column"),
	};

	[
		("TITLE_PAGE_LAYOUT", title.to_string()),
		("TOC_LAYOUT", toc.to_string()),
		("MAIN_CONTENT_LAYOUT", body.to_string()),
	]
}

fn metadata_tokens(config: &BookConfig) -> [(&'static str, String); 4] {
	let project = &config.project;

	[
		("DOCUMENT_TITLE", project.title.clone()),
		("DOCUMENT_AUTHOR", project.author.clone()),
		("DOCUMENT_SUBTITLE", project.subtitle.clone()),
		("DOCUMENT_DATE", project.date.clone()),
	]
}

/// Wrap a bare length in `\vspace*{}`. Values that are already a command are
/// kept and an empty value stays empty.
fn vspace_command(value: &str) -> String {
	if value.is_empty() || value.starts_with('\\') {
		value.to_string()
	} else {
		format!("\\vspace*{{{value}}}")
	}
}

fn custom_title_content(config: &BookConfig) -> String {
	let title_page = &config.title_page_content;
	if !title_page.enabled {
		return String::new();
	}

	format!(
		"\\begin{{center}}\n{}\n\\end{{center}}",
		title_page.description
	)
}

fn spacing_tokens(config: &BookConfig) -> [(&'static str, String); 21] {
	let spacing = &config.spacing;
	let toc = &config.table_of_contents;

	[
		("SECTION_SPACING_BEFORE", spacing.section_before.clone()),
		("SECTION_SPACING_AFTER", spacing.section_after.clone()),
		("SUBSECTION_SPACING_BEFORE", spacing.subsection_before.clone()),
		("SUBSECTION_SPACING_AFTER", spacing.subsection_after.clone()),
		(
			"SUBSUBSECTION_SPACING_BEFORE",
			spacing.subsubsection_before.clone(),
		),
		(
			"SUBSUBSECTION_SPACING_AFTER",
			spacing.subsubsection_after.clone(),
		),
		("PARAGRAPH_SKIP", spacing.paragraph_skip.clone()),
		("PARAGRAPH_INDENT", spacing.paragraph_indent.clone()),
		("TOC_SPACING_BEFORE", vspace_command(&toc.spacing.before_toc)),
		("TOC_SPACING_AFTER", vspace_command(&toc.spacing.after_toc)),
		("TOC_DEPTH", toc.structure.depth.clone()),
		("TOC_FONT_SIZE", toc.structure.font_size.clone()),
		("TOC_SEC_SPACING", toc.spacing.before_section.clone()),
		("TOC_SUBSEC_SPACING", toc.spacing.before_subsection.clone()),
		(
			"TOC_SUBSUBSEC_SPACING",
			toc.spacing.before_subsubsection.clone(),
		),
		("TOC_SEC_FONT", toc.styling.fonts.section.clone()),
		("TOC_SUBSEC_FONT", toc.styling.fonts.subsection.clone()),
		("TOC_SUBSUBSEC_FONT", toc.styling.fonts.subsubsection.clone()),
		("PAGE_STYLE", spacing.page_style.clone()),
		("HEADER_FOOTER_SETTINGS", spacing.header_footer.clone()),
		("CUSTOM_TITLE_CONTENT", custom_title_content(config)),
	]
}
