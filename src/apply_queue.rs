use crate::batch::normalize_path;
use crate::host::EditSurface;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

/// Readiness-wait budget for one queue entry: bounded retry count with a
/// fixed delay (no backoff). Exceeding the budget fails that entry only.
#[derive(Debug, Clone)]
pub struct ApplyQueueConfig {
	pub ready_retries: u32,
	pub ready_delay: Duration,
}

impl Default for ApplyQueueConfig {
	fn default() -> Self {
		Self {
			ready_retries: 10,
			ready_delay: Duration::from_millis(100),
		}
	}
}

struct PendingApply {
	file_path: String,
	content: String,
	done: oneshot::Sender<Result<()>>,
}

struct QueueInner {
	entries: VecDeque<PendingApply>,
	processing: bool,
}

/// FIFO queue serializing writes to the editing surface.
///
/// At most one entry is being applied at a time; each entry opens its target
/// file, waits for the surface to be ready for that exact file, writes, then
/// signals completion and the next entry starts. A failed entry rejects its
/// own completion signal and the queue moves on — it never deadlocks the
/// remaining entries.
pub struct ApplyQueue {
	surface: Arc<dyn EditSurface>,
	inner: Arc<Mutex<QueueInner>>,
	config: ApplyQueueConfig,
}

impl ApplyQueue {
	pub fn new(surface: Arc<dyn EditSurface>, config: ApplyQueueConfig) -> Self {
		Self {
			surface,
			inner: Arc::new(Mutex::new(QueueInner {
				entries: VecDeque::new(),
				processing: false,
			})),
			config,
		}
	}

	/// Enqueues a write and waits for its completion signal. Submission order
	/// is the application order.
	pub async fn enqueue(&self, file_path: &str, content: String) -> Result<()> {
		let file_path = normalize_path(file_path);
		let (done_tx, done_rx) = oneshot::channel();

		{
			let mut inner = self.inner.lock().await;
			inner.entries.push_back(PendingApply {
				file_path: file_path.clone(),
				content,
				done: done_tx,
			});
			debug!(file_path = %file_path, queued = inner.entries.len(), "apply entry enqueued");

			if !inner.processing {
				inner.processing = true;
				tokio::spawn(Self::drain(
					self.surface.clone(),
					self.inner.clone(),
					self.config.clone(),
				));
			}
		}

		done_rx.await.map_err(|_| Error::apply_interrupted(file_path))?
	}

	/// Drains the queue one entry at a time. The `processing` flag is cleared
	/// under the same lock that observes the empty queue, so an enqueue can
	/// never race into a state with entries but no drainer.
	async fn drain(surface: Arc<dyn EditSurface>, inner: Arc<Mutex<QueueInner>>, config: ApplyQueueConfig) {
		loop {
			let entry = {
				let mut inner = inner.lock().await;
				match inner.entries.pop_front() {
					Some(entry) => entry,
					None => {
						inner.processing = false;
						return;
					}
				}
			};

			let res = Self::apply_entry(&surface, &config, &entry.file_path, &entry.content).await;
			if let Err(err) = &res {
				warn!(file_path = %entry.file_path, %err, "apply entry failed, continuing with next");
			}
			// The submitter may have stopped waiting; that is not an apply failure.
			let _ = entry.done.send(res);
		}
	}

	async fn apply_entry(
		surface: &Arc<dyn EditSurface>,
		config: &ApplyQueueConfig,
		file_path: &str,
		content: &str,
	) -> Result<()> {
		surface.open(file_path).await?;

		let mut attempts = 0;
		while !surface.is_ready_for(file_path).await {
			attempts += 1;
			if attempts >= config.ready_retries {
				return Err(Error::surface_not_ready(file_path, attempts));
			}
			tokio::time::sleep(config.ready_delay).await;
		}

		surface.write(file_path, content).await
	}
}

// region:    --- Tests


// endregion: --- Tests
