//! Sandbox root and path containment.
//!
//! Every path handed to a tool is relative to the sandbox root. Resolution
//! collapses `.` and `..` lexically and then requires the result to sit under
//! the root; the nearest existing ancestor is also canonicalized so a symlink
//! inside the root cannot point the operation somewhere else. Dangling
//! symlinks are followed through their link targets the same way.
//!
//! Containment is decided before any existence check, so an out-of-root path
//! always yields the same error whether or not the target exists.

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::error::ToolError;

/// The directory all tool operations are confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot {
    path: PathBuf,
}

impl SandboxRoot {
    /// Establish a sandbox root. The directory must exist; it is canonicalized
    /// once here and never changes afterwards.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("sandbox root is not a directory: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Absolute, canonical root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `relative` against the root, rejecting anything that escapes it.
    ///
    /// `action` only feeds the error message ("read", "write to", ...).
    pub fn resolve(&self, relative: &str, action: &'static str) -> Result<PathBuf, ToolError> {
        let violation = || ToolError::SandboxViolation {
            action,
            path: relative.to_string(),
        };

        if relative.contains('\0') {
            return Err(violation());
        }

        let resolved = normalize_lexical(&self.path.join(relative));
        if !resolved.starts_with(&self.path) {
            return Err(violation());
        }

        let contained = real_location(&resolved).is_some_and(|real| real.starts_with(&self.path));
        if !contained {
            tracing::warn!(path = %relative, "Path escapes sandbox through a symlink");
            return Err(violation());
        }

        Ok(resolved)
    }
}

/// Collapse `.` and `..` without touching the filesystem. `..` never climbs
/// above the filesystem root.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Symlink hops followed before a path is treated as unresolvable.
const MAX_SYMLINK_HOPS: u32 = 40;

/// Canonicalize the nearest existing ancestor of `path` and re-append the
/// rest, so symlinks are followed even for targets that don't exist yet.
///
/// A dangling symlink along the way is followed through its link target.
/// Returns `None` when the chain is too long or the link can't be read.
fn real_location(path: &Path) -> Option<PathBuf> {
    real_location_bounded(path, MAX_SYMLINK_HOPS)
}

fn real_location_bounded(path: &Path, hops: u32) -> Option<PathBuf> {
    let mut ancestor = path;
    let mut tail: Vec<&OsStr> = Vec::new();
    loop {
        if let Ok(canonical) = ancestor.canonicalize() {
            return Some(append_tail(canonical, &tail));
        }

        let is_link = ancestor
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if is_link {
            let hops = hops.checked_sub(1)?;
            let target = ancestor.read_link().ok()?;
            let base = match ancestor.parent() {
                Some(parent) => parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf()),
                None => PathBuf::from("/"),
            };
            let next = append_tail(normalize_lexical(&base.join(target)), &tail);
            return real_location_bounded(&next, hops);
        }

        if let Some(name) = ancestor.file_name() {
            tail.push(name);
        }
        match ancestor.parent() {
            Some(parent) if parent != ancestor => ancestor = parent,
            _ => return Some(path.to_path_buf()),
        }
    }
}

/// Re-append the components collected while walking up, innermost last.
fn append_tail(mut base: PathBuf, tail: &[&OsStr]) -> PathBuf {
    for part in tail.iter().rev() {
        base.push(part);
    }
    base
}
