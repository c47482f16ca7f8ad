//! Root confinement for every client-supplied path, plus the CORS policy the
//! API advertises.

use crate::errors::{AppError, AppResult};
use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue},
    Router,
};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tower_http::set_header::SetResponseHeaderLayer;

/// A lowercase extension whitelist, without the leading dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions(&'static [&'static str]);

impl Extensions {
    pub const MARKDOWN: Extensions = Extensions(&["md"]);
    pub const LOGS: Extensions = Extensions(&["log", "txt"]);

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .map(|e| self.0.iter().any(|allowed| *allowed == e))
            .unwrap_or(false)
    }

    /// `.md`, `.log and .txt`, `.a, .b and .c`.
    pub fn describe(&self) -> String {
        let dotted: Vec<String> = self.0.iter().map(|e| format!(".{e}")).collect();
        match dotted.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        }
    }
}

/// The canonical root directory. Every path handed to the filesystem layer
/// comes out of [`Sandbox::resolve`].
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: &Path) -> anyhow::Result<Self> {
        let root = dunce::canonicalize(root)?;
        if !root.is_dir() {
            anyhow::bail!("root is not a directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final component of the root, as shown to clients.
    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn resolve(&self, rel: &str, allowed: Option<&Extensions>) -> AppResult<PathBuf> {
        if rel.is_empty() {
            return Err(AppError::invalid("missing path"));
        }
        let path = canonicalize_lenient(&self.root.join(rel))?;
        // component-wise: `/srv/docs-evil` does not start with `/srv/docs`
        if !path.starts_with(&self.root) {
            return Err(AppError::invalid("invalid path"));
        }
        if let Some(exts) = allowed {
            if !exts.matches(&path) {
                return Err(AppError::invalid(format!(
                    "only {} files are allowed",
                    exts.describe()
                )));
            }
        }
        Ok(path)
    }

    /// Root-relative, `/`-joined form of a path under the root.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

/// Applies components left to right, canonicalizing every prefix that exists
/// so symlinks are resolved before `..` is applied to them. Components that do
/// not exist yet are appended as written, which lets writes target new files.
fn canonicalize_lenient(joined: &Path) -> AppResult<PathBuf> {
    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir => out.push(comp.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => {
                out.push(name);
                match dunce::canonicalize(&out) {
                    Ok(c) => out = c,
                    Err(e) => match fs::symlink_metadata(&out) {
                        // dangling or looping link: its target is unknowable
                        Ok(meta) if meta.file_type().is_symlink() => {
                            return Err(AppError::invalid("invalid path"))
                        }
                        Ok(_) => return Err(AppError::Io(e)),
                        Err(_) => {}
                    },
                }
            }
        }
    }
    Ok(out)
}

pub fn content_length_ok(headers: &HeaderMap, max_kb: usize) -> AppResult<()> {
    if let Some(len) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if len > max_kb * 1024 {
            return Err(AppError::RequestTooLarge);
        }
    }
    Ok(())
}

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,PUT,OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// Stamps the permissive CORS headers on every response, errors and
/// preflights included. Only acceptable on a trusted network.
pub fn allow_any_origin<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    CORS_HEADERS.iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::overriding(
            name.clone(),
            HeaderValue::from_static(*value),
        ))
    })
}
