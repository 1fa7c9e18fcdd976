use super::TestResult;
use simple_fs::SPath;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn new_out_dir_path(prefix: &str) -> TestResult<SPath> {
	let now_ms = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
	let dir = PathBuf::from("tests/.out").join(format!("{prefix}_{now_ms}"));
	std::fs::create_dir_all(&dir)?;
	let dir = SPath::try_from(dir)?;

	Ok(dir)
}

/// Assistant-style response editing two files, used by the pipeline suites.
pub fn two_file_response() -> &'static str {
	r#"I'll update both files.

src/greet.rs
<<<<<<< SEARCH
fn greet() {
    println!("hi");
}
=======
fn greet() {
    println!("hello");
}
>>>>>>> REPLACE

src/count.rs
<<<<<<< SEARCH
const COUNT: usize = 1;
=======
const COUNT: usize = 2;
>>>>>>> REPLACE
"#
}
