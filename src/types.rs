use crate::files::{log_chunk::LogChunk, tree::TreeNode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub root: String,
    pub items: Vec<TreeNode>,
}

/// First value of `key`; later repeats are ignored.
fn first(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[derive(Debug, Default)]
pub struct FileQuery {
    pub path: String,
}

impl FileQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self { path: first(pairs, "path").unwrap_or_default() }
    }
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub ok: bool,
    pub path: String,
}

/// Numbers stay strings here so malformed values surface as `InvalidPath`
/// rather than an extractor rejection.
#[derive(Debug, Default)]
pub struct LogQuery {
    pub path: String,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl LogQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            path: first(pairs, "path").unwrap_or_default(),
            offset: first(pairs, "offset"),
            limit: first(pairs, "limit"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub path: String,
    #[serde(flatten)]
    pub chunk: LogChunk,
}
