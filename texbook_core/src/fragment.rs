use derive_more::Deref;

use crate::LayoutMode;

/// The three LaTeX sectioning tiers used for directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
	Section,
	Subsection,
	Subsubsection,
}

impl HeadingLevel {
	/// Map a directory depth (starting at 1) onto a tier. Anything deeper than
	/// three reuses the deepest tier.
	pub fn from_depth(depth: usize) -> Self {
		match depth {
			0 | 1 => Self::Section,
			2 => Self::Subsection,
			_ => Self::Subsubsection,
		}
	}

	pub fn command(self) -> &'static str {
		match self {
			Self::Section => "section",
			Self::Subsection => "subsection",
			Self::Subsubsection => "subsubsection",
		}
	}
}

/// One listed code file. `name` and `description` are already escaped,
/// `body` is verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
	pub name: String,
	pub description: Option<String>,
	pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentBlock {
	Heading { level: HeadingLevel, title: String },
	Listing(Listing),
}

/// The generated body of the book: headings and code listings in traversal
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct ContentFragment {
	blocks: Vec<FragmentBlock>,
}

impl ContentFragment {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn push(&mut self, block: FragmentBlock) {
		self.blocks.push(block);
	}

	pub(crate) fn append(&mut self, other: ContentFragment) {
		self.blocks.extend(other.blocks);
	}

	pub fn listings(&self) -> impl Iterator<Item = &Listing> {
		self.blocks.iter().filter_map(|block| {
			match block {
				FragmentBlock::Listing(listing) => Some(listing),
				FragmentBlock::Heading { .. } => None,
			}
		})
	}

	/// Render the fragment as LaTeX source.
	pub fn render(&self, layout: LayoutMode) -> String {
		let spacing = if layout.is_dense() { "0.1em" } else { "0.3em" };
		let mut output = String::new();

		for block in &self.blocks {
			match block {
				FragmentBlock::Heading { level, title } => {
					output.push_str(&format!("\\{}{{{title}}}\n\n", level.command()));
				}
				FragmentBlock::Listing(listing) => {
					output.push_str(&format!("\\subsubsection{{{}}}\n", listing.name));

					if let Some(description) = &listing.description {
						output.push_str(&format!("\\textit{{{description}}}\\par\n"));
						output.push_str("\\vspace{0.1em}\n");
					}

					output.push_str("\\begin{lstlisting}\n");
					output.push_str(&listing.body);
					if !listing.body.ends_with('\n') {
						output.push('\n');
					}
					output.push_str("\\end{lstlisting}\n\n");
					output.push_str(&format!("\\vspace{{{spacing}}}\n\n"));
				}
			}
		}

		output
	}
}
