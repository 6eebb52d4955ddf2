use std::ops::Range;

use logos::Logos;

/// The marker replaced by the generated content in legacy templates.
pub const LEGACY_MARKER: &str = "%__AUTO_INSERTED_CONTENT__";

/// Raw character classes produced by logos. Markers are assembled from these
/// by [`TokenWalker`], which keeps logos free of any backtracking.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("%")]
	Percent,
	#[regex(r"[A-Z_]+")]
	Upper,
	#[regex(r"[^{}%A-Z_]+")]
	Text,
}

/// A piece of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
	/// Text copied to the output unchanged.
	Literal(&'a str),
	/// A `{{NAME}}` marker. Holds the name without braces.
	Marker(&'a str),
	/// The legacy `%__AUTO_INSERTED_CONTENT__` insertion point.
	LegacyMarker,
}

impl Segment<'_> {
	/// The source text this segment was read from.
	pub fn source_text(&self) -> String {
		match self {
			Self::Literal(text) => (*text).to_string(),
			Self::Marker(name) => format!("{{{{{name}}}}}"),
			Self::LegacyMarker => LEGACY_MARKER.to_string(),
		}
	}
}

/// Walks the logos token stream and groups it into [`Segment`]s.
struct TokenWalker<'a> {
	/// The template source.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	/// Start of the literal run that hasn't been emitted yet.
	literal_start: usize,
	/// Collected segments.
	segments: Vec<Segment<'a>>,
}

impl<'a> TokenWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			literal_start: 0,
			segments: vec![],
		}
	}

	fn kind_at(&self, index: usize) -> Option<RawToken> {
		self.raw_tokens
			.get(index)
			.and_then(|(result, _)| result.as_ref().ok().copied())
	}

	fn span_at(&self, index: usize) -> Range<usize> {
		self.raw_tokens[index].1.clone()
	}

	/// Emit the pending literal run that ends at byte `end`.
	fn flush_literal(&mut self, end: usize) {
		if end > self.literal_start {
			self.segments
				.push(Segment::Literal(&self.source[self.literal_start..end]));
		}
	}

	/// `{` `{` NAME `}` `}` starting at the cursor.
	fn is_marker(&self) -> bool {
		let expected = [
			RawToken::BraceOpen,
			RawToken::BraceOpen,
			RawToken::Upper,
			RawToken::BraceClose,
			RawToken::BraceClose,
		];

		expected
			.iter()
			.enumerate()
			.all(|(offset, kind)| self.kind_at(self.cursor + offset) == Some(*kind))
	}

	/// `%` followed by an uppercase run that starts with the legacy marker
	/// name. Returns the byte length of the marker's name part.
	fn legacy_marker_name_len(&self) -> Option<usize> {
		let name = &LEGACY_MARKER[1..];

		if self.kind_at(self.cursor) != Some(RawToken::Percent)
			|| self.kind_at(self.cursor + 1) != Some(RawToken::Upper)
		{
			return None;
		}

		let span = self.span_at(self.cursor + 1);
		self.source[span].starts_with(name).then_some(name.len())
	}

	fn process(mut self) -> Vec<Segment<'a>> {
		while self.cursor < self.raw_tokens.len() {
			if self.is_marker() {
				let start = self.span_at(self.cursor).start;
				let name = self.span_at(self.cursor + 2);
				self.flush_literal(start);
				self.segments.push(Segment::Marker(&self.source[name]));
				self.cursor += 5;
				self.literal_start = self.span_at(self.cursor - 1).end;
				continue;
			}

			if let Some(name_len) = self.legacy_marker_name_len() {
				let start = self.span_at(self.cursor).start;
				let upper = self.span_at(self.cursor + 1);
				self.flush_literal(start);
				self.segments.push(Segment::LegacyMarker);
				self.cursor += 2;
				// Anything glued to the end of the marker stays literal text.
				self.literal_start = upper.start + name_len;
				continue;
			}

			self.cursor += 1;
		}

		self.flush_literal(self.source.len());
		self.segments
	}
}

/// Split a template into literal runs, `{{NAME}}` markers and legacy
/// insertion markers. Concatenating the [`Segment::source_text`] of every
/// segment gives back the original source.
pub fn tokenize(source: &str) -> Vec<Segment<'_>> {
	TokenWalker::new(source).process()
}
