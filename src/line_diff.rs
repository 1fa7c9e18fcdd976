use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Line-ending convention of a source text, recorded before normalization so
/// the final text can be written back with the original convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
	Lf,
	CrLf,
}

impl LineEnding {
	pub fn detect(text: &str) -> Self {
		if text.contains("\r\n") { Self::CrLf } else { Self::Lf }
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Lf => "\n",
			Self::CrLf => "\r\n",
		}
	}

	/// Re-applies this convention to an LF-normalized text.
	pub fn restore(&self, text: &str) -> String {
		match self {
			Self::Lf => text.to_string(),
			Self::CrLf => text.replace('\n', "\r\n"),
		}
	}
}

/// Kind of a changed run in the combined text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
	Added,
	Removed,
}

/// One maximal contiguous run of same-kind lines in the combined text.
/// Lines are 1-based and inclusive. Blocks never overlap and are sorted by
/// `start_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffBlock {
	pub kind: DiffKind,
	pub start_line: u32,
	pub end_line: u32,
}

impl DiffBlock {
	pub fn line_count(&self) -> u32 {
		self.end_line - self.start_line + 1
	}
}

/// A line-range paint instruction for the host's decoration sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
	pub kind: DiffKind,
	pub start_line: u32,
	pub end_line: u32,
}

impl From<&DiffBlock> for Decoration {
	fn from(block: &DiffBlock) -> Self {
		Self {
			kind: block.kind,
			start_line: block.start_line,
			end_line: block.end_line,
		}
	}
}

/// Output of [`compute_line_diff`]: the combined (original+merged interleaved)
/// text, the paint decorations, and the resolvable blocks.
#[derive(Debug, Clone)]
pub struct LineDiff {
	pub combined_text: String,
	pub decorations: Vec<Decoration>,
	pub blocks: Vec<DiffBlock>,
	pub eol: LineEnding,
}

/// Computes the line-level alignment of `original` vs `merged` and derives
/// the combined text: unchanged lines appear once, removed runs appear
/// (struck originals) followed by the added runs that replace them.
///
/// With `ignore_whitespace`, the alignment compares trimmed lines while the
/// output still carries the original lines.
pub fn compute_line_diff(original: &str, merged: &str, ignore_whitespace: bool) -> LineDiff {
	let eol = LineEnding::detect(original);

	let original = original.replace("\r\n", "\n");
	let merged = merged.replace("\r\n", "\n");

	let old_lines: Vec<&str> = original.split('\n').collect();
	let new_lines: Vec<&str> = merged.split('\n').collect();

	let ops = if ignore_whitespace {
		let old_trimmed: Vec<&str> = old_lines.iter().map(|l| l.trim()).collect();
		let new_trimmed: Vec<&str> = new_lines.iter().map(|l| l.trim()).collect();
		capture_diff_slices(Algorithm::Myers, &old_trimmed, &new_trimmed)
	} else {
		capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines)
	};

	let mut walk = RunWalk::default();

	for op in &ops {
		match op {
			DiffOp::Equal { old_index, len, .. } => {
				walk.push_run(&old_lines[*old_index..old_index + len], None);
			}
			DiffOp::Delete { old_index, old_len, .. } => {
				walk.push_run(&old_lines[*old_index..old_index + old_len], Some(DiffKind::Removed));
			}
			DiffOp::Insert { new_index, new_len, .. } => {
				walk.push_run(&new_lines[*new_index..new_index + new_len], Some(DiffKind::Added));
			}
			DiffOp::Replace {
				old_index,
				old_len,
				new_index,
				new_len,
			} => {
				// Removed originals first, then the added replacements.
				walk.push_run(&old_lines[*old_index..old_index + old_len], Some(DiffKind::Removed));
				walk.push_run(&new_lines[*new_index..new_index + new_len], Some(DiffKind::Added));
			}
		}
	}

	let RunWalk { combined, blocks, .. } = walk;

	let decorations = blocks.iter().map(Decoration::from).collect();

	LineDiff {
		combined_text: combined.join("\n"),
		decorations,
		blocks,
		eol,
	}
}

/// Accumulates the combined output while walking diff runs, keeping the
/// 1-based line counter and the coalesced blocks in sync.
struct RunWalk<'a> {
	combined: Vec<&'a str>,
	blocks: Vec<DiffBlock>,
	counter: u32,
}

impl Default for RunWalk<'_> {
	fn default() -> Self {
		Self {
			combined: Vec::new(),
			blocks: Vec::new(),
			counter: 1,
		}
	}
}

impl<'a> RunWalk<'a> {
	fn push_run(&mut self, lines: &[&'a str], kind: Option<DiffKind>) {
		if lines.is_empty() {
			return;
		}
		let start = self.counter;
		self.combined.extend_from_slice(lines);
		self.counter += lines.len() as u32;
		if let Some(kind) = kind {
			self.blocks.push(DiffBlock {
				kind,
				start_line: start,
				end_line: self.counter - 1,
			});
		}
	}
}

/// Finds the modification partner of `blocks[idx]`: a removed block
/// immediately followed by an added block (or vice versa, with no unchanged
/// line between them) represents one logical edit and resolves as a unit.
pub fn modification_partner(blocks: &[DiffBlock], idx: usize) -> Option<usize> {
	let block = blocks.get(idx)?;
	match block.kind {
		DiffKind::Removed => blocks
			.iter()
			.position(|b| b.kind == DiffKind::Added && b.start_line == block.end_line + 1),
		DiffKind::Added => blocks
			.iter()
			.position(|b| b.kind == DiffKind::Removed && b.end_line + 1 == block.start_line),
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_line_diff_identical_texts() {
		// -- Exec
		let diff = compute_line_diff("a\nb\nc", "a\nb\nc", false);

		// -- Check
		assert!(diff.blocks.is_empty());
		assert!(diff.decorations.is_empty());
		assert_eq!(diff.combined_text, "a\nb\nc");
	}

	#[test]
	fn test_line_diff_pure_addition() {
		// -- Exec
		let diff = compute_line_diff("a\nc", "a\nb\nc", false);

		// -- Check
		assert_eq!(diff.combined_text, "a\nb\nc");
		assert_eq!(diff.blocks.len(), 1);
		assert_eq!(diff.blocks[0].kind, DiffKind::Added);
		assert_eq!((diff.blocks[0].start_line, diff.blocks[0].end_line), (2, 2));
	}

	#[test]
	fn test_line_diff_pure_removal() {
		// -- Exec
		let diff = compute_line_diff("a\nb\nc", "a\nc", false);

		// -- Check
		// Removed line stays visible in the combined text.
		assert_eq!(diff.combined_text, "a\nb\nc");
		assert_eq!(diff.blocks.len(), 1);
		assert_eq!(diff.blocks[0].kind, DiffKind::Removed);
		assert_eq!((diff.blocks[0].start_line, diff.blocks[0].end_line), (2, 2));
	}

	#[test]
	fn test_line_diff_modification_interleaves() {
		// -- Exec
		let diff = compute_line_diff("a\nold\nc", "a\nnew\nc", false);

		// -- Check
		// Combined holds both the struck original and the replacement.
		assert_eq!(diff.combined_text, "a\nold\nnew\nc");
		assert_eq!(diff.blocks.len(), 2);
		assert_eq!(diff.blocks[0].kind, DiffKind::Removed);
		assert_eq!((diff.blocks[0].start_line, diff.blocks[0].end_line), (2, 2));
		assert_eq!(diff.blocks[1].kind, DiffKind::Added);
		assert_eq!((diff.blocks[1].start_line, diff.blocks[1].end_line), (3, 3));
	}

	#[test]
	fn test_line_diff_blocks_sorted_and_disjoint() {
		// -- Exec
		let diff = compute_line_diff("a\nx\nb\ny\nc", "a\nX\nb\nY\nc", false);

		// -- Check
		assert_eq!(diff.blocks.len(), 4);
		for pair in diff.blocks.windows(2) {
			assert!(pair[0].end_line < pair[1].start_line);
		}
	}

	#[test]
	fn test_line_diff_modification_partner() {
		// -- Setup & Fixtures
		let diff = compute_line_diff("a\nold\nc", "a\nnew\nc", false);

		// -- Exec & Check
		assert_eq!(modification_partner(&diff.blocks, 0), Some(1));
		assert_eq!(modification_partner(&diff.blocks, 1), Some(0));
	}

	#[test]
	fn test_line_diff_no_partner_across_context() {
		// -- Setup & Fixtures
		// Removal and addition separated by an unchanged line: not a pair.
		let diff = compute_line_diff("x\na\nc", "a\nc\ny", false);

		// -- Exec & Check
		for idx in 0..diff.blocks.len() {
			assert_eq!(modification_partner(&diff.blocks, idx), None);
		}
	}

	#[test]
	fn test_line_diff_ignore_whitespace() {
		// -- Exec
		let strict = compute_line_diff("  a\nb", "a\nb", false);
		let relaxed = compute_line_diff("  a\nb", "a\nb", true);

		// -- Check
		assert!(!strict.blocks.is_empty());
		assert!(relaxed.blocks.is_empty());
		// Output still carries the original (indented) line.
		assert_eq!(relaxed.combined_text, "  a\nb");
	}

	#[test]
	fn test_line_diff_crlf_detection() {
		// -- Exec
		let diff = compute_line_diff("a\r\nold\r\nc", "a\r\nnew\r\nc", false);

		// -- Check
		assert_eq!(diff.eol, LineEnding::CrLf);
		// Combined text is LF-normalized.
		assert_eq!(diff.combined_text, "a\nold\nnew\nc");
		assert_eq!(diff.eol.restore("a\nb"), "a\r\nb");
	}

	#[test]
	fn test_line_diff_multi_line_runs_coalesce() {
		// -- Exec
		let diff = compute_line_diff("a\nb\nc\nz", "a\nz", false);

		// -- Check
		assert_eq!(diff.blocks.len(), 1);
		assert_eq!((diff.blocks[0].start_line, diff.blocks[0].end_line), (2, 3));
		assert_eq!(diff.blocks[0].line_count(), 2);
	}
}

// endregion: --- Tests
