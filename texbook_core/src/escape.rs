use float_cmp::approx_eq;

/// Characters that carry meaning in LaTeX source and must be escaped when
/// they appear in plain text.
pub const SPECIAL_CHARACTERS: [char; 10] = ['\\', '{', '}', '$', '&', '%', '#', '^', '_', '~'];

/// The ten predefined LaTeX size commands, smallest first.
pub const NAMED_SIZES: [&str; 10] = [
	"tiny",
	"scriptsize",
	"footnotesize",
	"small",
	"normalsize",
	"large",
	"Large",
	"LARGE",
	"huge",
	"Huge",
];

/// Size command used when a size specification can't be understood.
pub const DEFAULT_NAMED_SIZE: &str = "small";

/// Leading factor used by [`format_size`] when no override is given. The
/// leading is always `size * (1 + factor)`, so `0.2` gives the conventional
/// 120% line height.
pub const DEFAULT_LEADING_FACTOR: f64 = 0.2;

/// Escape every LaTeX special character in `text`.
///
/// The input is scanned once from left to right and every replacement is
/// written straight to the output, so characters introduced by one
/// replacement (the braces of `\textbackslash{}`, the backslash of `\{`) are
/// never escaped a second time. The function is not idempotent: escaping
/// already-escaped text escapes the escapes. Callers should escape raw text
/// exactly once.
///
/// ```
/// use texbook_core::escape;
///
/// assert_eq!(escape("a_b & 50%"), r"a\_b \& 50\%");
/// assert_eq!(escape(r"\{x}"), r"\textbackslash{}\{x\}");
/// ```
pub fn escape(text: &str) -> String {
	if !text.contains(SPECIAL_CHARACTERS) {
		return text.to_string();
	}

	let mut escaped = String::with_capacity(text.len() + text.len() / 4);

	for ch in text.chars() {
		match ch {
			'\\' => escaped.push_str(r"\textbackslash{}"),
			'^' => escaped.push_str(r"\textasciicircum{}"),
			'~' => escaped.push_str(r"\textasciitilde{}"),
			'{' | '}' | '$' | '&' | '%' | '#' | '_' => {
				escaped.push('\\');
				escaped.push(ch);
			}
			_ => escaped.push(ch),
		}
	}

	escaped
}

/// A parsed font size specification.
#[derive(Debug, Clone, Copy)]
pub enum FontSize {
	/// An explicit size in points, written as `8` or `8pt`.
	Points(f64),
	/// One of the [`NAMED_SIZES`].
	Named(&'static str),
}

impl PartialEq for FontSize {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Points(a), Self::Points(b)) => approx_eq!(f64, *a, *b),
			(Self::Named(a), Self::Named(b)) => a == b,
			_ => false,
		}
	}
}

impl FontSize {
	/// Parse a bare number, a number with a `pt` suffix, or a named size (with
	/// or without its leading backslash).
	pub fn parse(spec: &str) -> Option<Self> {
		let spec = spec.trim();
		let name = spec.strip_prefix('\\').unwrap_or(spec);

		if let Some(named) = NAMED_SIZES.into_iter().find(|size| *size == name) {
			return Some(Self::Named(named));
		}

		let number = spec.strip_suffix("pt").unwrap_or(spec).trim();
		match number.parse::<f64>() {
			Ok(points) if points.is_finite() && points > 0.0 => Some(Self::Points(points)),
			_ => None,
		}
	}

	/// Whether `spec` is a size the formatter understands.
	pub fn is_valid(spec: &str) -> bool {
		Self::parse(spec).is_some()
	}

	/// The line height for this size given a relative spacing factor. Named
	/// sizes carry their own leading and return `None`.
	pub fn leading(self, factor: f64) -> Option<f64> {
		match self {
			Self::Points(points) => Some(points * (1.0 + factor)),
			Self::Named(_) => None,
		}
	}

	/// Render the size as a LaTeX sizing directive.
	pub fn directive(self, factor: f64) -> String {
		match self {
			Self::Points(points) => {
				format!(
					"\\fontsize{{{}}}{{{}}}\\selectfont",
					format_points(points),
					format_leading(points * (1.0 + factor))
				)
			}
			Self::Named(name) => format!("\\{name}"),
		}
	}
}

/// Format a size specification as a LaTeX sizing directive.
///
/// Point sizes produce `\fontsize{<size>}{<leading>}\selectfont` where the
/// leading is `size * (1 + factor)` rounded to one decimal. The factor is
/// `relative_spacing` when given and [`DEFAULT_LEADING_FACTOR`] otherwise.
/// Named sizes produce their command and anything unrecognised falls back to
/// [`DEFAULT_NAMED_SIZE`].
///
/// ```
/// use texbook_core::format_size;
///
/// assert_eq!(format_size("8pt", None), r"\fontsize{8pt}{9.6pt}\selectfont");
/// assert_eq!(format_size("8pt", Some(0.5)), r"\fontsize{8pt}{12.0pt}\selectfont");
/// assert_eq!(format_size("footnotesize", None), r"\footnotesize");
/// assert_eq!(format_size("enormous", None), r"\small");
/// ```
pub fn format_size(spec: &str, relative_spacing: Option<f64>) -> String {
	let factor = relative_spacing.unwrap_or(DEFAULT_LEADING_FACTOR);

	match FontSize::parse(spec) {
		Some(size) => size.directive(factor),
		None => format!("\\{DEFAULT_NAMED_SIZE}"),
	}
}

/// `8.0` becomes `8pt`, `7.5` stays `7.5pt`.
pub(crate) fn format_points(points: f64) -> String {
	format!("{points}pt")
}

/// Leading values are always rounded to one decimal place.
pub(crate) fn format_leading(points: f64) -> String {
	format!("{points:.1}pt")
}
