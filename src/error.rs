use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),

	// -- Merge & Apply
	#[display("Merge service failed for '{file_path}': {cause}")]
	MergeService { file_path: String, cause: String },

	#[display("Editing surface not ready for '{file_path}' after {attempts} attempts")]
	SurfaceNotReady { file_path: String, attempts: u32 },

	#[display("Apply entry for '{file_path}' was dropped before completion")]
	ApplyInterrupted { file_path: String },

	// -- Fs Surface
	#[display("Path '{target}' escapes base directory '{base_dir}'")]
	SecurityViolation { target: String, base_dir: String },

	#[display("Cannot read file '{path}': {cause}")]
	IoReadFile { path: String, cause: std::io::Error },

	#[display("Cannot write file '{path}': {cause}")]
	IoWriteFile { path: String, cause: std::io::Error },

	// -- Externals
	#[from]
	Io(std::io::Error),

	#[from]
	SimpleFs(simple_fs::Error),
}

// region:    --- Constructors

impl Error {
	pub fn merge_service(file_path: impl Into<String>, cause: impl std::fmt::Display) -> Self {
		Self::MergeService {
			file_path: file_path.into(),
			cause: cause.to_string(),
		}
	}

	pub fn surface_not_ready(file_path: impl Into<String>, attempts: u32) -> Self {
		Self::SurfaceNotReady {
			file_path: file_path.into(),
			attempts,
		}
	}

	pub fn apply_interrupted(file_path: impl Into<String>) -> Self {
		Self::ApplyInterrupted {
			file_path: file_path.into(),
		}
	}

	pub fn security_violation(target: impl Into<String>, base_dir: impl Into<String>) -> Self {
		Self::SecurityViolation {
			target: target.into(),
			base_dir: base_dir.into(),
		}
	}

	pub fn io_read_file(path: impl Into<String>, cause: std::io::Error) -> Self {
		Self::IoReadFile {
			path: path.into(),
			cause,
		}
	}

	pub fn io_write_file(path: impl Into<String>, cause: std::io::Error) -> Self {
		Self::IoWriteFile {
			path: path.into(),
			cause,
		}
	}

	pub fn simple_fs(cause: simple_fs::Error) -> Self {
		Self::SimpleFs(cause)
	}
}

// endregion: --- Constructors

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
