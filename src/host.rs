//! Collaborator interfaces of the host application.
//!
//! The core owns no network or filesystem surface; everything it needs from
//! the outside world comes through these seams. Hosts provide an editing
//! surface (usually an editor buffer), a merge service (remote reconciliation
//! or [`LocalMergeService`](crate::LocalMergeService)), and a decoration sink
//! to paint added/removed line ranges.

use crate::line_diff::{Decoration, DiffBlock};
use crate::Result;
use async_trait::async_trait;

/// Authoritative "current content" provider. May serve an in-memory draft or
/// a persisted copy; the core treats the returned text as the original.
pub trait TextSource: Send + Sync {
	fn current_content(&self, path: &str) -> Result<String>;
}

/// The editing surface that actually mutates visible content.
///
/// `is_ready_for` reports whether the surface can accept a write for exactly
/// that file; the apply queue polls it with a bounded fixed-delay budget.
#[async_trait]
pub trait EditSurface: Send + Sync {
	async fn open(&self, path: &str) -> Result<()>;
	async fn is_ready_for(&self, path: &str) -> bool;
	async fn write(&self, path: &str, content: &str) -> Result<()>;
}

/// Remote/async merge reconciliation step invoked by the orchestrator's
/// precompute jobs.
#[async_trait]
pub trait MergeService: Send + Sync {
	async fn compute_merge(&self, partial_code: &str, original_code: &str, file_name: &str) -> Result<String>;
}

/// Receives line-range paint instructions plus the interactive zones for
/// per-block accept/reject actions.
pub trait DecorationSink: Send + Sync {
	fn apply(&self, path: &str, decorations: &[Decoration], zones: &[ActionZone]);
	fn clear(&self, path: &str);
}

/// One interactive accept/reject zone. When the block has a modification
/// partner (adjacent opposite-kind block), both resolve as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionZone {
	pub block: DiffBlock,
	pub partner: Option<DiffBlock>,
}

/// Builds the action zones for a set of unresolved blocks.
pub fn action_zones(blocks: &[DiffBlock]) -> Vec<ActionZone> {
	blocks
		.iter()
		.enumerate()
		.map(|(idx, block)| ActionZone {
			block: *block,
			partner: crate::line_diff::modification_partner(blocks, idx).map(|p| blocks[p]),
		})
		.collect()
}

// region:    --- Tests


// endregion: --- Tests
