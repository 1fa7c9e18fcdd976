use crate::apply_queue::{ApplyQueue, ApplyQueueConfig};
use crate::batch::{BatchKey, GeneratedFile, normalize_path};
use crate::diff_session::{DiffSession, SessionStore};
use crate::host::{DecorationSink, EditSurface, MergeService, TextSource, action_zones};
use crate::line_diff::compute_line_diff;
use crate::merge_engine::merge_blocks;
use crate::block_parser::parse_edit_blocks;
use crate::{EditBlock, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Outcome of one precompute job, cached per file for the lifetime of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
	pub original_code: String,
	pub merged_code: String,
}

/// Per-file merge lifecycle, keyed by normalized path and scoped to one
/// assistant response batch.
#[derive(Debug, Clone, Default)]
pub enum MergeState {
	#[default]
	Idle,
	Pending,
	Ready(MergeResult),
	Error(String),
}

#[derive(Default)]
struct StateMap {
	batch_key: Option<BatchKey>,
	states: HashMap<String, MergeState>,
}

/// Coordinates the merge lifecycle across files: speculative precompute,
/// cached results with staleness checks, batch-scoped invalidation, diff
/// sessions, and the serialized apply queue.
///
/// All shared state (the state map and the session store) is owned here and
/// injected at construction; there are no ambient globals.
pub struct MergeOrchestrator {
	source: Arc<dyn TextSource>,
	service: Arc<dyn MergeService>,
	decorations: Arc<dyn DecorationSink>,
	states: Arc<Mutex<StateMap>>,
	settled: watch::Sender<u64>,
	queue: ApplyQueue,
	store: Mutex<SessionStore>,
}

impl MergeOrchestrator {
	pub fn new(
		source: Arc<dyn TextSource>,
		service: Arc<dyn MergeService>,
		surface: Arc<dyn EditSurface>,
		decorations: Arc<dyn DecorationSink>,
		store: SessionStore,
	) -> Self {
		Self::with_queue_config(source, service, surface, decorations, store, ApplyQueueConfig::default())
	}

	pub fn with_queue_config(
		source: Arc<dyn TextSource>,
		service: Arc<dyn MergeService>,
		surface: Arc<dyn EditSurface>,
		decorations: Arc<dyn DecorationSink>,
		store: SessionStore,
		queue_config: ApplyQueueConfig,
	) -> Self {
		let (settled, _) = watch::channel(0u64);
		Self {
			source,
			service,
			decorations,
			states: Arc::new(Mutex::new(StateMap::default())),
			settled,
			queue: ApplyQueue::new(surface, queue_config),
			store: Mutex::new(store),
		}
	}

	// -- Batch lifecycle

	/// Registers a new assistant response batch and starts speculative
	/// precompute jobs for its files.
	///
	/// When the computed key differs from the current one, every cached
	/// per-file state is cleared and results of still-running jobs from the
	/// superseded batch will be discarded on arrival.
	pub async fn begin_batch(&self, files: &[GeneratedFile]) -> BatchKey {
		let key = BatchKey::compute(files);

		{
			let mut map = self.states.lock().await;
			if map.batch_key == Some(key) {
				debug!("batch unchanged, keeping cached merge states");
				return key;
			}
			debug!(?key, "new batch, resetting merge states");
			map.batch_key = Some(key);
			map.states.clear();
			for file in files {
				map.states.insert(normalize_path(&file.path), MergeState::Pending);
			}
		}

		for file in files {
			self.spawn_precompute(file.clone(), key);
		}
		key
	}

	/// Current state for a file (`Idle` when the file is unknown).
	pub async fn state_of(&self, path: &str) -> MergeState {
		let map = self.states.lock().await;
		map.states.get(&normalize_path(path)).cloned().unwrap_or_default()
	}

	/// Resolves the merge for one file, reusing the cached or in-flight
	/// result where possible.
	///
	/// A `ready` result is served only while the live content still equals
	/// the captured original; a stale result is discarded and recomputed. A
	/// failed merge service degrades to the assistant's raw text as the
	/// merged result — the caller always gets a usable result.
	pub async fn merge_for(&self, file: &GeneratedFile) -> Result<MergeResult> {
		let path = normalize_path(&file.path);

		loop {
			// Subscribe before inspecting so a settle between the check and the
			// wait is never missed.
			let mut settled_rx = self.settled.subscribe();

			let mut spawn_key = None;
			{
				let mut map = self.states.lock().await;
				match map.states.get(&path) {
					Some(MergeState::Ready(result)) => {
						let live = self.source.current_content(&file.path)?;
						if live == result.original_code {
							debug!(file_path = %path, "serving cached merge result");
							return Ok(result.clone());
						}
						warn!(file_path = %path, "cached merge result is stale, recomputing");
						map.states.insert(path.clone(), MergeState::Pending);
						spawn_key = Some(Self::batch_key_for(&mut map, file));
					}
					Some(MergeState::Pending) => {}
					Some(MergeState::Error(msg)) => {
						warn!(file_path = %path, cause = %msg, "merge service failed, falling back to raw text");
						let original = self.source.current_content(&file.path)?;
						return Ok(MergeResult {
							original_code: original,
							merged_code: file.content.clone(),
						});
					}
					Some(MergeState::Idle) | None => {
						map.states.insert(path.clone(), MergeState::Pending);
						spawn_key = Some(Self::batch_key_for(&mut map, file));
					}
				}
			}

			match spawn_key {
				Some(key) => self.spawn_precompute(file.clone(), key),
				None => {
					// Pending: reuse the in-flight job instead of starting a duplicate.
					let _ = settled_rx.changed().await;
				}
			}
		}
	}

	fn batch_key_for(map: &mut StateMap, file: &GeneratedFile) -> BatchKey {
		*map.batch_key.get_or_insert_with(|| BatchKey::compute(std::slice::from_ref(file)))
	}

	fn spawn_precompute(&self, file: GeneratedFile, key: BatchKey) {
		let source = self.source.clone();
		let service = self.service.clone();
		let states = self.states.clone();
		let settled = self.settled.clone();

		tokio::spawn(async move {
			let path = normalize_path(&file.path);

			let outcome = async {
				let original = source.current_content(&file.path)?;
				let merged = service.compute_merge(&file.content, &original, &file.path).await?;
				Ok::<_, crate::Error>(MergeResult {
					original_code: original,
					merged_code: merged,
				})
			}
			.await;

			let mut map = states.lock().await;
			if map.batch_key != Some(key) {
				warn!(file_path = %path, "discarding merge result from superseded batch");
				return;
			}
			let state = match outcome {
				Ok(result) => {
					debug!(file_path = %path, "merge precompute ready");
					MergeState::Ready(result)
				}
				Err(err) => MergeState::Error(err.to_string()),
			};
			map.states.insert(path, state);
			settled.send_modify(|v| *v += 1);
		});
	}

	// -- Visualization & resolution

	/// Merges one file and visualizes the result: the combined text is
	/// written through the apply queue and the added/removed decorations are
	/// painted. No-op when the merge changes nothing.
	pub async fn visualize(&self, file: &GeneratedFile, ignore_whitespace: bool) -> Result<()> {
		let result = self.merge_for(file).await?;
		let diff = compute_line_diff(&result.original_code, &result.merged_code, ignore_whitespace);
		if diff.blocks.is_empty() {
			debug!(file_path = %file.path, "merge produced no changes, nothing to visualize");
			return Ok(());
		}

		let session = DiffSession::new(&file.path, &result.original_code, &result.merged_code, &diff);
		let combined = session.current_text();
		let zones = action_zones(&diff.blocks);

		{
			let mut store = self.store.lock().await;
			store.insert(session);
		}

		self.queue.enqueue(&file.path, combined).await?;
		self.decorations.apply(&normalize_path(&file.path), &diff.decorations, &zones);
		Ok(())
	}

	/// Accepts every pending change of one file.
	pub async fn keep_all(&self, path: &str) -> Result<()> {
		self.transform(path, |session| {
			session.keep_all();
			true
		})
		.await
	}

	/// Rejects every pending change of one file, restoring its original.
	pub async fn reject_all(&self, path: &str) -> Result<()> {
		self.transform(path, |session| {
			session.reject_all();
			true
		})
		.await
	}

	/// Accepts the block starting at `start_line` (with its partner).
	pub async fn keep_block(&self, path: &str, start_line: u32) -> Result<()> {
		self.transform(path, |session| session.keep_block(start_line)).await
	}

	/// Rejects the block starting at `start_line` (with its partner).
	pub async fn reject_block(&self, path: &str, start_line: u32) -> Result<()> {
		self.transform(path, |session| session.reject_block(start_line)).await
	}

	/// Accepts every pending change across all files with a session. Files
	/// are applied in store order through the queue; one failing file does
	/// not stop the rest, and the first error is reported.
	pub async fn keep_all_files(&self) -> Result<()> {
		self.resolve_all_files(true).await
	}

	/// Rejects every pending change across all files with a session.
	pub async fn reject_all_files(&self) -> Result<()> {
		self.resolve_all_files(false).await
	}

	/// Rebuilds the visualization of a snapshotted session (after the user
	/// navigates back to the file) from its combined text, preserving
	/// accept/reject progress. Returns false when no session exists.
	///
	/// A restore failure (surface not ready) is swallowed: the session stays
	/// in the store for the next opportunity, never silently destroyed.
	pub async fn restore_visualization(&self, path: &str) -> bool {
		let (combined, decorations, zones) = {
			let store = self.store.lock().await;
			let Some(session) = store.get(path) else {
				return false;
			};
			(
				session.current_text(),
				session.decorations(),
				action_zones(session.unresolved_blocks()),
			)
		};

		match self.queue.enqueue(path, combined).await {
			Ok(()) => {
				self.decorations.apply(&normalize_path(path), &decorations, &zones);
				true
			}
			Err(err) => {
				warn!(file_path = %path, %err, "restore failed, session kept pending");
				false
			}
		}
	}

	/// Drops a file's session without applying anything (the user came back
	/// with no pending changes).
	pub async fn clear_session(&self, path: &str) {
		let mut store = self.store.lock().await;
		if store.remove(path).is_some() {
			self.decorations.clear(&normalize_path(path));
		}
	}

	pub async fn has_session(&self, path: &str) -> bool {
		self.store.lock().await.contains(path)
	}

	// -- Transform internals

	async fn transform<F>(&self, path: &str, apply: F) -> Result<()>
	where
		F: FnOnce(&mut DiffSession) -> bool,
	{
		let (text, resolved, decorations, zones) = {
			let mut store = self.store.lock().await;
			let Some(session) = store.get_mut(path) else {
				// Resolved or never visualized: nothing left to transform.
				return Ok(());
			};
			if !apply(session) {
				return Ok(());
			}
			let resolved = session.is_resolved();
			let text = session.current_text();
			let decorations = session.decorations();
			let zones = action_zones(session.unresolved_blocks());
			if resolved {
				store.remove(path);
			}
			(text, resolved, decorations, zones)
		};

		self.queue.enqueue(path, text).await?;
		if resolved {
			self.decorations.clear(&normalize_path(path));
		} else {
			self.decorations.apply(&normalize_path(path), &decorations, &zones);
		}
		Ok(())
	}

	async fn resolve_all_files(&self, keep: bool) -> Result<()> {
		let paths: Vec<String> = {
			let store = self.store.lock().await;
			store.file_ids()
		};

		let mut first_err = None;
		for path in paths {
			let res = if keep { self.keep_all(&path).await } else { self.reject_all(&path).await };
			if let Err(err) = res {
				warn!(file_path = %path, %err, "batch resolution failed for file, continuing");
				if first_err.is_none() {
					first_err = Some(err);
				}
			}
		}
		match first_err {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

// region:    --- LocalMergeService

/// In-process [`MergeService`] backed by the block parser and merge engine.
/// Hosts without a remote reconciliation step use this as their service.
pub struct LocalMergeService;

#[async_trait]
impl MergeService for LocalMergeService {
	async fn compute_merge(&self, partial_code: &str, original_code: &str, file_name: &str) -> Result<String> {
		let blocks = parse_edit_blocks(partial_code, Some(file_name));
		if blocks.is_empty() {
			// No SEARCH/REPLACE structure: the partial code is the whole file.
			return Ok(partial_code.to_string());
		}

		let target = normalize_path(file_name);
		let file_blocks: Vec<EditBlock> = blocks
			.into_iter()
			.filter(|b| normalize_path(&b.file_path) == target || b.file_path == "unknown")
			.collect();

		let (merged, report) = merge_blocks(original_code, &file_blocks);
		debug!(
			file_name = %file_name,
			applied = report.applied,
			skipped = report.skipped.len(),
			"local merge completed"
		);
		Ok(merged)
	}
}

// endregion: --- LocalMergeService

// region:    --- Tests


// endregion: --- Tests
