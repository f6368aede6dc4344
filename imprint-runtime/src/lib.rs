//! Runtime linked into every generated program: resolves the base directory,
//! rebuilds the manifest from the embedded table and reconciles it.

mod error;
mod runtime;

pub use error::RuntimeError;
pub use imprint_core::EmbeddedFile;
pub use runtime::{
    execute, exit_status, run, RuntimeSettings, BASE_DIR_ENV, DRY_RUN_ENV, MAX_CONCURRENCY_ENV,
};
