use crate::batch::normalize_path;
use crate::line_diff::{Decoration, DiffBlock, DiffKind, LineDiff, LineEnding, modification_partner};
use std::collections::HashMap;
use tracing::debug;

/// The live, resolvable visualization state for one file's pending diff.
///
/// Holds the combined (original+merged interleaved) text plus the blocks the
/// user has not yet accepted or rejected. Keep drops removed runs (accepting
/// the replacement); reject drops added runs (restoring the original). The
/// session is done when no unresolved blocks remain.
#[derive(Debug, Clone)]
pub struct DiffSession {
	file_id: String,
	original_code: String,
	merged_code: String,
	combined_text: String,
	eol: LineEnding,
	unresolved: Vec<DiffBlock>,
}

impl DiffSession {
	pub fn new(file_id: impl Into<String>, original_code: impl Into<String>, merged_code: impl Into<String>, diff: &LineDiff) -> Self {
		Self {
			file_id: normalize_path(&file_id.into()),
			original_code: original_code.into(),
			merged_code: merged_code.into(),
			combined_text: diff.combined_text.clone(),
			eol: diff.eol,
			unresolved: diff.blocks.clone(),
		}
	}

	pub fn file_id(&self) -> &str {
		&self.file_id
	}

	pub fn original_code(&self) -> &str {
		&self.original_code
	}

	pub fn merged_code(&self) -> &str {
		&self.merged_code
	}

	pub fn unresolved_blocks(&self) -> &[DiffBlock] {
		&self.unresolved
	}

	pub fn is_resolved(&self) -> bool {
		self.unresolved.is_empty()
	}

	/// Decorations for the current combined text, rebuilt from the unresolved
	/// blocks. Used when a visualization is restored after navigation instead
	/// of recomputing the diff from scratch.
	pub fn decorations(&self) -> Vec<Decoration> {
		self.unresolved.iter().map(Decoration::from).collect()
	}

	/// The combined text in the file's original line-ending convention.
	pub fn current_text(&self) -> String {
		self.eol.restore(&self.combined_text)
	}

	/// The final text, available once every block is resolved.
	pub fn final_text(&self) -> Option<String> {
		if self.is_resolved() { Some(self.current_text()) } else { None }
	}

	/// Accepts every pending change: all removed runs are dropped from the
	/// combined text. No-op on an already resolved session.
	pub fn keep_all(&mut self) {
		let ranges = self.ranges_of_kind(DiffKind::Removed);
		self.unresolved.clear();
		self.delete_ranges(&ranges);
		debug!(file_id = %self.file_id, "session keep-all applied");
	}

	/// Rejects every pending change: all added runs are dropped, restoring
	/// the original content. No-op on an already resolved session.
	pub fn reject_all(&mut self) {
		let ranges = self.ranges_of_kind(DiffKind::Added);
		self.unresolved.clear();
		self.delete_ranges(&ranges);
		debug!(file_id = %self.file_id, "session reject-all applied");
	}

	/// Accepts the block starting at `start_line` (and its modification
	/// partner, when one exists). Returns false when no unresolved block
	/// starts there.
	pub fn keep_block(&mut self, start_line: u32) -> bool {
		self.resolve_block(start_line, DiffKind::Removed)
	}

	/// Rejects the block starting at `start_line` (and its partner).
	pub fn reject_block(&mut self, start_line: u32) -> bool {
		self.resolve_block(start_line, DiffKind::Added)
	}

	// -- Transform internals

	fn resolve_block(&mut self, start_line: u32, delete_kind: DiffKind) -> bool {
		let Some(idx) = self.unresolved.iter().position(|b| b.start_line == start_line) else {
			return false;
		};

		let mut indices = vec![idx];
		if let Some(partner) = modification_partner(&self.unresolved, idx) {
			indices.push(partner);
		}

		let ranges: Vec<(u32, u32)> = indices
			.iter()
			.map(|&i| self.unresolved[i])
			.filter(|b| b.kind == delete_kind)
			.map(|b| (b.start_line, b.end_line))
			.collect();

		indices.sort_unstable_by(|a, b| b.cmp(a));
		for i in indices {
			self.unresolved.remove(i);
		}

		self.delete_ranges(&ranges);
		self.shift_blocks(&ranges);
		true
	}

	/// Deletes 1-based inclusive line ranges from the combined text, in
	/// descending start order so earlier deletions don't shift the ranges not
	/// yet processed.
	fn delete_ranges(&mut self, ranges: &[(u32, u32)]) {
		if ranges.is_empty() {
			return;
		}
		let mut ranges: Vec<(u32, u32)> = ranges.to_vec();
		ranges.sort_unstable_by(|a, b| b.0.cmp(&a.0));

		let new_text = {
			let mut lines: Vec<&str> = self.combined_text.split('\n').collect();
			for (start, end) in &ranges {
				let s = (*start as usize - 1).min(lines.len());
				let e = (*end as usize).min(lines.len());
				if s < e {
					lines.drain(s..e);
				}
			}
			lines.join("\n")
		};
		self.combined_text = new_text;
	}

	/// Shifts the still-unresolved blocks up past the deleted ranges (range
	/// coordinates are pre-deletion, as are the blocks').
	fn shift_blocks(&mut self, deleted: &[(u32, u32)]) {
		for block in &mut self.unresolved {
			let mut shift = 0u32;
			for (start, end) in deleted {
				if block.start_line > *end {
					shift += end - start + 1;
				}
			}
			block.start_line -= shift;
			block.end_line -= shift;
		}
	}

	fn ranges_of_kind(&self, kind: DiffKind) -> Vec<(u32, u32)> {
		self.unresolved
			.iter()
			.filter(|b| b.kind == kind)
			.map(|b| (b.start_line, b.end_line))
			.collect()
	}
}

// region:    --- SessionStore

/// Owned, keyed store of the per-file [`DiffSession`]s of one open project.
///
/// This is the single source of truth for "what is still unresolved" per
/// file. Created empty at startup and injected into the orchestrator; entries
/// are removed as files resolve.
#[derive(Debug, Default)]
pub struct SessionStore {
	sessions: HashMap<String, DiffSession>,
}

impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshots a session, replacing any previous one for the same file.
	pub fn insert(&mut self, session: DiffSession) {
		self.sessions.insert(session.file_id.clone(), session);
	}

	pub fn get(&self, file_id: &str) -> Option<&DiffSession> {
		self.sessions.get(&normalize_path(file_id))
	}

	pub fn get_mut(&mut self, file_id: &str) -> Option<&mut DiffSession> {
		self.sessions.get_mut(&normalize_path(file_id))
	}

	pub fn remove(&mut self, file_id: &str) -> Option<DiffSession> {
		self.sessions.remove(&normalize_path(file_id))
	}

	pub fn contains(&self, file_id: &str) -> bool {
		self.sessions.contains_key(&normalize_path(file_id))
	}

	/// File ids of every live session, sorted for deterministic iteration.
	pub fn file_ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
		ids.sort();
		ids
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}
}

// endregion: --- SessionStore

// region:    --- Tests


// endregion: --- Tests
