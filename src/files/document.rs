use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::Path;

pub fn read_document(path: &Path) -> AppResult<String> {
    if path.is_dir() {
        return Err(AppError::invalid("not a file"));
    }
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| AppError::InvalidEncoding)
}

/// Last write wins; there is no locking between concurrent writers.
pub fn write_document(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
