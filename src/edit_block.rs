/// One parsed SEARCH/REPLACE instruction for a single file.
///
/// Immutable once parsed. Empty `search_lines` means the block creates a new
/// file; empty `replace_lines` with a non-empty search means a pure deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBlock {
	pub file_path: String,
	pub search_lines: Vec<String>,
	pub replace_lines: Vec<String>,
}

impl EditBlock {
	pub fn new(file_path: impl Into<String>, search_lines: Vec<String>, replace_lines: Vec<String>) -> Self {
		Self {
			file_path: file_path.into(),
			search_lines,
			replace_lines,
		}
	}

	pub fn is_creation(&self) -> bool {
		self.search_lines.is_empty()
	}

	pub fn is_deletion(&self) -> bool {
		!self.search_lines.is_empty() && self.replace_lines.is_empty()
	}

	/// First search line, for log/report messages.
	pub fn search_head(&self) -> &str {
		self.search_lines.first().map(|s| s.as_str()).unwrap_or("")
	}
}

/// Ordered collection of [`EditBlock`]s for one parse pass.
///
/// Source order is preserved; a file may appear several times when the
/// assistant edits it in disjoint places.
#[derive(Debug, Clone, Default)]
pub struct EditBlocks {
	blocks: Vec<EditBlock>,
}

impl EditBlocks {
	pub fn new(blocks: Vec<EditBlock>) -> Self {
		Self { blocks }
	}

	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	pub fn len(&self) -> usize {
		self.blocks.len()
	}

	/// Blocks for one file, in source order.
	pub fn for_file<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a EditBlock> {
		self.blocks.iter().filter(move |b| b.file_path == file_path)
	}

	/// Distinct file paths, in order of first appearance.
	pub fn file_paths(&self) -> Vec<&str> {
		let mut paths: Vec<&str> = Vec::new();
		for block in &self.blocks {
			if !paths.contains(&block.file_path.as_str()) {
				paths.push(&block.file_path);
			}
		}
		paths
	}
}

// region:    --- Iterators

impl EditBlocks {
	pub fn iter(&self) -> std::slice::Iter<'_, EditBlock> {
		self.blocks.iter()
	}
}

impl IntoIterator for EditBlocks {
	type Item = EditBlock;
	type IntoIter = std::vec::IntoIter<Self::Item>;

	fn into_iter(self) -> Self::IntoIter {
		self.blocks.into_iter()
	}
}

impl<'a> IntoIterator for &'a EditBlocks {
	type Item = &'a EditBlock;
	type IntoIter = std::slice::Iter<'a, EditBlock>;

	fn into_iter(self) -> Self::IntoIter {
		self.blocks.iter()
	}
}

// endregion: --- Iterators
