// region:    --- Modules

mod apply_queue;
mod batch;
mod block_parser;
mod diff_session;
mod edit_block;
mod error;
mod fs_surface;
mod host;
mod line_diff;
mod merge_engine;
mod orchestrator;

pub use apply_queue::*;
pub use batch::*;
pub use block_parser::*;
pub use diff_session::*;
pub use edit_block::*;
pub use error::*;
pub use fs_surface::*;
pub use host::*;
pub use line_diff::*;
pub use merge_engine::*;
pub use orchestrator::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// endregion: --- Modules
