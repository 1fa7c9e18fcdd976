use crate::EditBlock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Informational outcome of one merge pass. Does not affect the merged text.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
	pub applied: usize,
	pub skipped: Vec<SkippedBlock>,
}

#[derive(Debug, Clone)]
pub struct SkippedBlock {
	pub file_path: String,
	pub search_head: String,
	pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// Search text absent from the current content (exact and trimmed match both failed).
	NoMatch,
	/// Creation block (empty search) against non-empty current content.
	CreationIntoNonEmpty,
}

/// Applies `blocks` (in parse order) to `original`, producing the merged text.
///
/// Blocks are processed in reverse source order so that line positions
/// computed against the current text are not invalidated by edits applied
/// later in the same pass. A block whose search text cannot be located is
/// skipped; the merge never aborts for one bad block.
pub fn merge_blocks(original: &str, blocks: &[EditBlock]) -> (String, MergeReport) {
	let mut report = MergeReport::default();

	if blocks.is_empty() {
		return (original.to_string(), report);
	}

	let mut current = original.to_string();

	for block in blocks.iter().rev() {
		// -- Creation block (empty search)
		if block.is_creation() {
			if current.is_empty() {
				// A creation block implies a fresh file, not a partial splice.
				current = block.replace_lines.join("\n");
				report.applied += 1;
				break;
			}
			warn!(
				file_path = %block.file_path,
				"creation block against non-empty content, ignored"
			);
			report.skipped.push(SkippedBlock {
				file_path: block.file_path.clone(),
				search_head: block.search_head().to_string(),
				reason: SkipReason::CreationIntoNonEmpty,
			});
			continue;
		}

		let lines: Vec<&str> = current.split('\n').collect();

		let Some(start) = find_match(&lines, &block.search_lines) else {
			warn!(
				file_path = %block.file_path,
				search_head = %block.search_head(),
				"no match for search block, skipped"
			);
			report.skipped.push(SkippedBlock {
				file_path: block.file_path.clone(),
				search_head: block.search_head().to_string(),
				reason: SkipReason::NoMatch,
			});
			continue;
		};
		let end = start + block.search_lines.len();

		log_indent_drift(block);

		// -- Splice: before / replacement / after, dropping empty segments so no
		//    spurious blank separators appear at the file boundaries.
		let before = lines[..start].join("\n");
		let replacement = block.replace_lines.join("\n");
		let after = lines[end..].join("\n");

		let segments: Vec<&str> = [before.as_str(), replacement.as_str(), after.as_str()]
			.into_iter()
			.filter(|s| !s.is_empty())
			.collect();
		current = segments.join("\n");
		report.applied += 1;
	}

	(current, report)
}

// region:    --- Support

/// Locates the search region in `lines`: exact line-for-line match first,
/// then a retry ignoring each line's leading/trailing whitespace (tolerates
/// reformatted indentation in the assistant's SEARCH text).
fn find_match(lines: &[&str], search_lines: &[String]) -> Option<usize> {
	let n = search_lines.len();
	if n == 0 || n > lines.len() {
		return None;
	}

	// -- Exact
	for start in 0..=(lines.len() - n) {
		if (0..n).all(|k| lines[start + k] == search_lines[k]) {
			return Some(start);
		}
	}

	// -- Trimmed
	for start in 0..=(lines.len() - n) {
		if (0..n).all(|k| lines[start + k].trim() == search_lines[k].trim()) {
			return Some(start);
		}
	}

	None
}

/// Builds the trimmed-content → original-indentation map of the search lines
/// (first occurrence wins) and logs when a replace line reuses known content
/// at a different indentation. Diagnostic only; replace lines keep their
/// explicit indentation verbatim.
fn log_indent_drift(block: &EditBlock) {
	let mut indent_by_content: HashMap<&str, &str> = HashMap::new();
	for line in &block.search_lines {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}
		let indent = &line[..line.len() - line.trim_start().len()];
		indent_by_content.entry(trimmed).or_insert(indent);
	}

	for line in &block.replace_lines {
		if line.is_empty() {
			continue;
		}
		let trimmed = line.trim();
		let indent = &line[..line.len() - line.trim_start().len()];
		if let Some(expected) = indent_by_content.get(trimmed) {
			if *expected != indent {
				debug!(
					file_path = %block.file_path,
					line = %trimmed,
					"replace line indentation differs from matching search line"
				);
			}
		}
	}
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
