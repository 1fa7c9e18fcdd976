use crate::batch::normalize_path;
use crate::host::{EditSurface, TextSource};
use crate::{Error, Result};
use async_trait::async_trait;
use simple_fs::{SPath, ensure_file_dir, read_to_string};

/// Filesystem-backed [`TextSource`] + [`EditSurface`] for hosts without an
/// editor buffer. Every read and write is confined to `base_dir`; a path that
/// escapes it after collapsing is refused.
pub struct FsSurface {
	base_dir: SPath,
}

impl FsSurface {
	pub fn new(base_dir: impl Into<SPath>) -> Result<Self> {
		let base_dir = base_dir.into();
		let base_dir = if base_dir.is_absolute() {
			base_dir.into_collapsed()
		} else {
			let cwd = std::env::current_dir().map_err(|err| Error::io_read_file(".", err))?;
			let cwd = SPath::from_std_path(cwd)?.into_collapsed();
			cwd.join(base_dir).into_collapsed()
		};
		Ok(Self { base_dir })
	}

	pub fn base_dir(&self) -> &SPath {
		&self.base_dir
	}

	fn full_path(&self, path: &str) -> Result<SPath> {
		let full = self.base_dir.join(normalize_path(path)).into_collapsed();
		if !full.as_str().starts_with(self.base_dir.as_str()) {
			return Err(Error::security_violation(full.to_string(), self.base_dir.to_string()));
		}
		Ok(full)
	}
}

impl TextSource for FsSurface {
	/// A missing file reads as empty: that is the "original" a creation
	/// block merges against.
	fn current_content(&self, path: &str) -> Result<String> {
		let full = self.full_path(path)?;
		if !full.exists() {
			return Ok(String::new());
		}
		read_to_string(&full).map_err(Error::simple_fs)
	}
}

#[async_trait]
impl EditSurface for FsSurface {
	async fn open(&self, _path: &str) -> Result<()> {
		Ok(())
	}

	async fn is_ready_for(&self, _path: &str) -> bool {
		true
	}

	async fn write(&self, path: &str, content: &str) -> Result<()> {
		let full = self.full_path(path)?;
		ensure_file_dir(&full).map_err(Error::simple_fs)?;
		std::fs::write(&full, content).map_err(|err| Error::io_write_file(full.to_string(), err))?;
		Ok(())
	}
}

// region:    --- Tests


// endregion: --- Tests
