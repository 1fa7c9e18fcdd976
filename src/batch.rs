use std::hash::Hasher;
use twox_hash::XxHash32;

/// One file of an assistant response batch: the target path and the raw
/// (partial) code the assistant produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
	pub path: String,
	pub content: String,
}

impl GeneratedFile {
	pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			content: content.into(),
		}
	}
}

/// Content-derived identity of one assistant response batch.
///
/// Derived from the batch's file set (normalized paths, order-insensitive)
/// and per-file content lengths. Two batches with the same key are treated
/// as the same response; a differing key supersedes all cached merge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchKey(u64);

impl BatchKey {
	pub fn compute(files: &[GeneratedFile]) -> Self {
		let mut entries: Vec<(String, usize)> = files
			.iter()
			.map(|f| (normalize_path(&f.path), f.content.len()))
			.collect();
		entries.sort();

		let mut hasher = XxHash32::with_seed(0);
		for (path, len) in entries {
			hasher.write(path.as_bytes());
			hasher.write(&(len as u64).to_le_bytes());
		}
		Self(hasher.finish())
	}
}

/// Normalizes a file path for use as a state/session/queue key: backslashes
/// become slashes and a leading `./` is stripped, so the same file addressed
/// two ways shares one entry.
pub fn normalize_path(path: &str) -> String {
	let path = path.trim().replace('\\', "/");
	let path = path.strip_prefix("./").unwrap_or(&path);
	path.to_string()
}

// region:    --- Tests


// endregion: --- Tests
