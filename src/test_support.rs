//! In-memory host implementations for tests and examples.

use crate::batch::normalize_path;
use crate::host::{ActionZone, DecorationSink, EditSurface, MergeService, TextSource};
use crate::line_diff::Decoration;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// region:    --- MemoryHost

/// In-memory [`TextSource`] + [`EditSurface`] with a write log and a
/// configurable readiness counter.
#[derive(Default)]
pub struct MemoryHost {
	files: Mutex<HashMap<String, String>>,
	writes: Mutex<Vec<(String, String)>>,
	ready_calls: AtomicU32,
	/// 0 = always ready; n = ready from the n-th `is_ready_for` call on;
	/// `u32::MAX` = never ready.
	ready_after: AtomicU32,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_file(self, path: &str, content: &str) -> Self {
		self.set_file(path, content);
		self
	}

	pub fn set_file(&self, path: &str, content: &str) {
		self.files
			.lock()
			.expect("files lock")
			.insert(normalize_path(path), content.to_string());
	}

	pub fn content(&self, path: &str) -> Option<String> {
		self.files.lock().expect("files lock").get(&normalize_path(path)).cloned()
	}

	/// Write log in application order: `(path, content)` per write.
	pub fn writes(&self) -> Vec<(String, String)> {
		self.writes.lock().expect("writes lock").clone()
	}

	pub fn set_ready_after(&self, n: u32) {
		self.ready_after.store(n, Ordering::SeqCst);
	}

	pub fn set_never_ready(&self) {
		self.ready_after.store(u32::MAX, Ordering::SeqCst);
	}
}

impl TextSource for MemoryHost {
	fn current_content(&self, path: &str) -> Result<String> {
		Ok(self.content(path).unwrap_or_default())
	}
}

#[async_trait]
impl EditSurface for MemoryHost {
	async fn open(&self, _path: &str) -> Result<()> {
		Ok(())
	}

	async fn is_ready_for(&self, _path: &str) -> bool {
		let after = self.ready_after.load(Ordering::SeqCst);
		if after == 0 {
			return true;
		}
		let call = self.ready_calls.fetch_add(1, Ordering::SeqCst) + 1;
		call >= after
	}

	async fn write(&self, path: &str, content: &str) -> Result<()> {
		let path = normalize_path(path);
		self.writes
			.lock()
			.expect("writes lock")
			.push((path.clone(), content.to_string()));
		self.files.lock().expect("files lock").insert(path, content.to_string());
		Ok(())
	}
}

// endregion: --- MemoryHost

// region:    --- RecordingDecorations

/// [`DecorationSink`] that records every apply/clear call.
#[derive(Default)]
pub struct RecordingDecorations {
	applies: Mutex<Vec<(String, Vec<Decoration>, Vec<ActionZone>)>>,
	clears: Mutex<Vec<String>>,
}

impl RecordingDecorations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn applies(&self) -> Vec<(String, Vec<Decoration>, Vec<ActionZone>)> {
		self.applies.lock().expect("applies lock").clone()
	}

	pub fn clears(&self) -> Vec<String> {
		self.clears.lock().expect("clears lock").clone()
	}

	/// Decorations of the most recent apply for `path`.
	pub fn last_for(&self, path: &str) -> Option<Vec<Decoration>> {
		self.applies
			.lock()
			.expect("applies lock")
			.iter()
			.rev()
			.find(|(p, _, _)| p == path)
			.map(|(_, d, _)| d.clone())
	}
}

impl DecorationSink for RecordingDecorations {
	fn apply(&self, path: &str, decorations: &[Decoration], zones: &[ActionZone]) {
		self.applies
			.lock()
			.expect("applies lock")
			.push((path.to_string(), decorations.to_vec(), zones.to_vec()));
	}

	fn clear(&self, path: &str) {
		self.clears.lock().expect("clears lock").push(path.to_string());
	}
}

// endregion: --- RecordingDecorations

// region:    --- StubMergeService

/// [`MergeService`] stub: echoes the partial code as the merged result, with
/// optional delay and failure modes, counting every call.
pub struct StubMergeService {
	calls: AtomicU32,
	delay: Option<Duration>,
	fail_msg: Option<String>,
}

impl StubMergeService {
	pub fn echo() -> Self {
		Self {
			calls: AtomicU32::new(0),
			delay: None,
			fail_msg: None,
		}
	}

	pub fn echo_with_delay(delay: Duration) -> Self {
		Self {
			delay: Some(delay),
			..Self::echo()
		}
	}

	pub fn failing(msg: &str) -> Self {
		Self {
			fail_msg: Some(msg.to_string()),
			..Self::echo()
		}
	}

	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl MergeService for StubMergeService {
	async fn compute_merge(&self, partial_code: &str, _original_code: &str, file_name: &str) -> Result<String> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(msg) = &self.fail_msg {
			return Err(Error::merge_service(file_name, msg));
		}
		Ok(partial_code.to_string())
	}
}

// endregion: --- StubMergeService
