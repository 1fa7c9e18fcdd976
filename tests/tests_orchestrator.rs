//! End-to-end orchestrator tests against the in-memory host.

type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

use srmergex::test_support::{MemoryHost, RecordingDecorations};
use srmergex::{
	ApplyQueueConfig, GeneratedFile, LocalMergeService, MergeOrchestrator, SessionStore,
};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(host: &Arc<MemoryHost>, decorations: &Arc<RecordingDecorations>) -> MergeOrchestrator {
	MergeOrchestrator::new(
		host.clone(),
		Arc::new(LocalMergeService),
		host.clone(),
		decorations.clone(),
		SessionStore::new(),
	)
}

fn search_replace(path: &str, search: &str, replace: &str) -> GeneratedFile {
	GeneratedFile::new(
		path,
		format!("{path}\n<<<<<<< SEARCH\n{search}\n=======\n{replace}\n>>>>>>> REPLACE\n"),
	)
}

#[tokio::test]
async fn test_orchestrator_e2e_visualize_then_keep_all() -> Result<()> {
	// -- Setup & Fixtures
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", "alpha\nbeta\ngamma\n"));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let file = search_replace("src/a.rs", "beta", "BETA");

	// -- Exec
	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;
	let combined = host.content("src/a.rs").ok_or("combined should be written")?;
	orch.keep_all("src/a.rs").await?;

	// -- Check
	// The visualization interleaved both versions, the keep resolved to merged.
	assert_eq!(combined, "alpha\nbeta\nBETA\ngamma\n");
	assert_eq!(host.content("src/a.rs").as_deref(), Some("alpha\nBETA\ngamma\n"));
	assert!(!orch.has_session("src/a.rs").await);
	assert_eq!(decorations.clears(), vec!["src/a.rs"]);

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_reject_all_restores_original() -> Result<()> {
	// -- Setup & Fixtures
	let original = "alpha\nbeta\ngamma\n";
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", original));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let file = search_replace("src/a.rs", "beta", "BETA");

	// -- Exec
	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;
	orch.reject_all("src/a.rs").await?;

	// -- Check
	assert_eq!(host.content("src/a.rs").as_deref(), Some(original));
	assert!(!orch.has_session("src/a.rs").await);

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_keep_all_files_spans_batch() -> Result<()> {
	// -- Setup & Fixtures
	let host = Arc::new(
		MemoryHost::new()
			.with_file("src/a.rs", "one\nold_a\nthree\n")
			.with_file("src/b.rs", "four\nold_b\nsix\n"),
	);
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let files = [
		search_replace("src/a.rs", "old_a", "new_a"),
		search_replace("src/b.rs", "old_b", "new_b"),
	];

	// -- Exec
	orch.begin_batch(&files).await;
	for file in &files {
		orch.visualize(file, false).await?;
	}
	orch.keep_all_files().await?;

	// -- Check
	assert_eq!(host.content("src/a.rs").as_deref(), Some("one\nnew_a\nthree\n"));
	assert_eq!(host.content("src/b.rs").as_deref(), Some("four\nnew_b\nsix\n"));
	assert!(!orch.has_session("src/a.rs").await);
	assert!(!orch.has_session("src/b.rs").await);

	// Final writes happened after the two visualization writes, in order.
	let writes = host.writes();
	assert_eq!(writes.len(), 4);
	let final_paths: Vec<&str> = writes[2..].iter().map(|(p, _)| p.as_str()).collect();
	assert_eq!(final_paths, vec!["src/a.rs", "src/b.rs"]);

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_partial_keep_repaints() -> Result<()> {
	// -- Setup & Fixtures
	// Two separate edits in one file: resolve only the first.
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", "one\nfirst\nmid\nsecond\nnine\n"));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let content = "src/a.rs\n\
<<<<<<< SEARCH\nfirst\n=======\nFIRST\n>>>>>>> REPLACE\n\
<<<<<<< SEARCH\nsecond\n=======\nSECOND\n>>>>>>> REPLACE\n";
	let file = GeneratedFile::new("src/a.rs", content);

	// -- Exec
	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;
	// First unresolved block is the removed "first" line at combined line 2.
	orch.keep_block("src/a.rs", 2).await?;

	// -- Check
	assert!(orch.has_session("src/a.rs").await, "second edit still unresolved");
	// The combined text dropped the struck "first" but still shows both
	// versions of the second edit.
	assert_eq!(
		host.content("src/a.rs").as_deref(),
		Some("one\nFIRST\nmid\nsecond\nSECOND\nnine\n")
	);
	// Decorations re-applied for the remaining pair.
	let last = decorations.last_for("src/a.rs").ok_or("decorations should be painted")?;
	assert_eq!(last.len(), 2);

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_restore_visualization_after_navigation() -> Result<()> {
	// -- Setup & Fixtures
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", "alpha\nbeta\ngamma\n"));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let file = search_replace("src/a.rs", "beta", "BETA");

	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;
	let combined = host.content("src/a.rs").ok_or("combined should be written")?;

	// -- Exec
	// Simulate navigating away and back: the surface shows something else
	// meanwhile, then the session is restored from its snapshot.
	host.set_file("src/a.rs", "something else entirely");
	let restored = orch.restore_visualization("src/a.rs").await;

	// -- Check
	assert!(restored);
	assert_eq!(host.content("src/a.rs").as_deref(), Some(combined.as_str()));
	assert!(orch.has_session("src/a.rs").await);

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_restore_failure_keeps_session() -> Result<()> {
	// -- Setup & Fixtures
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", "alpha\nbeta\ngamma\n"));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = MergeOrchestrator::with_queue_config(
		host.clone(),
		Arc::new(LocalMergeService),
		host.clone(),
		decorations.clone(),
		SessionStore::new(),
		ApplyQueueConfig {
			ready_retries: 2,
			ready_delay: Duration::from_millis(5),
		},
	);
	let file = search_replace("src/a.rs", "beta", "BETA");

	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;

	// -- Exec
	// Surface stops accepting writes: restore must fail softly.
	host.set_never_ready();
	let restored = orch.restore_visualization("src/a.rs").await;

	// -- Check
	assert!(!restored);
	assert!(orch.has_session("src/a.rs").await, "session must survive a failed restore");

	Ok(())
}

#[tokio::test]
async fn test_orchestrator_e2e_clear_session() -> Result<()> {
	// -- Setup & Fixtures
	let host = Arc::new(MemoryHost::new().with_file("src/a.rs", "alpha\nbeta\n"));
	let decorations = Arc::new(RecordingDecorations::new());
	let orch = orchestrator(&host, &decorations);
	let file = search_replace("src/a.rs", "beta", "BETA");

	orch.begin_batch(std::slice::from_ref(&file)).await;
	orch.visualize(&file, false).await?;

	// -- Exec
	orch.clear_session("src/a.rs").await;

	// -- Check
	assert!(!orch.has_session("src/a.rs").await);
	assert_eq!(decorations.clears(), vec!["src/a.rs"]);

	Ok(())
}
