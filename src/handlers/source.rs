//! Content sources consumed by the file server.
//!
//! # Responsibilities
//! - Resolve rooted, cleaned request paths to files or directories
//! - Enumerate directory entries for listings
//! - Optionally deny every failed lookup (listing guard)
//!
//! # Design Decisions
//! - Names handed to a source are already cleaned, so joining them under
//!   the root cannot escape it
//! - I/O errors are classified once here; the file server only maps the
//!   classification to a status

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tokio::fs::File;

/// Why a lookup in a content source failed.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("directory listing denied")]
    ListingDenied,

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for OpenError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => OpenError::NotFound,
            io::ErrorKind::PermissionDenied => OpenError::PermissionDenied,
            _ => OpenError::Io(e),
        }
    }
}

/// An opened entry of a content source.
#[derive(Debug)]
pub enum Resource {
    File {
        path: PathBuf,
        file: File,
        len: u64,
        modified: Option<SystemTime>,
    },
    Directory {
        modified: Option<SystemTime>,
    },
}

impl Resource {
    pub fn is_dir(&self) -> bool {
        matches!(self, Resource::Directory { .. })
    }
}

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

/// A tree of files addressed by rooted paths such as `/css/site.css`.
pub trait ContentSource: Send + Sync + 'static {
    fn open(&self, name: &str) -> impl Future<Output = Result<Resource, OpenError>> + Send;

    fn list(&self, name: &str) -> impl Future<Output = Result<Vec<Entry>, OpenError>> + Send;
}

/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct Dir {
    root: PathBuf,
}

impl Dir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, OpenError> {
        if name.contains('\0') {
            return Err(OpenError::NotFound);
        }
        let relative = name.trim_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            return Err(OpenError::NotFound);
        }
        Ok(self.root.join(relative))
    }
}

impl ContentSource for Dir {
    async fn open(&self, name: &str) -> Result<Resource, OpenError> {
        let path = self.resolve(name)?;
        let metadata = tokio::fs::metadata(&path).await?;
        let modified = metadata.modified().ok();

        if metadata.is_dir() {
            return Ok(Resource::Directory { modified });
        }

        let file = File::open(&path).await?;
        Ok(Resource::File {
            path,
            file,
            len: metadata.len(),
            modified,
        })
    }

    async fn list(&self, name: &str) -> Result<Vec<Entry>, OpenError> {
        let path = self.resolve(name)?;
        let mut reader = tokio::fs::read_dir(&path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Wraps a source so that any failed open is reported as a denied listing.
///
/// A directory without `index.html` therefore never reaches the listing
/// stage.
#[derive(Debug, Clone)]
pub struct ListingGuard<S> {
    inner: S,
}

impl<S> ListingGuard<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: ContentSource> ContentSource for ListingGuard<S> {
    async fn open(&self, name: &str) -> Result<Resource, OpenError> {
        self.inner.open(name).await.map_err(|e| {
            tracing::debug!(name, error = %e, "Open failed behind listing guard");
            OpenError::ListingDenied
        })
    }

    async fn list(&self, name: &str) -> Result<Vec<Entry>, OpenError> {
        self.inner.list(name).await
    }
}
