//! Filesystem operations behind the sandbox. Everything here is blocking and
//! takes paths that have already been resolved.

pub mod document;
pub mod log_chunk;
pub mod tree;

use crate::errors::{AppError, AppResult};

/// Runs blocking filesystem work off the async executor.
pub async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?
}
