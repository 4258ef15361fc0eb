use crate::error::StorageError;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

fn traversal(path: &Path, reason: &'static str) -> StorageError {
    StorageError::PathTraversalAttempt {
        message: path.display().to_string().into(),
        context: Some(reason.into()),
    }
}

/// Collapses `.` and `..` lexically; `..` may never climb above the relative base.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(traversal(path, "Path attempted to escape sandbox via '..'"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(path, "Absolute paths are not allowed in sandbox"));
            }
        }
    }

    Ok(out)
}

/// Joins `path` onto `root` and proves the result stays inside it, following symlinks
/// of whatever part of the path already exists.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();
    let joined = root.join(normalize_relative(path)?);

    match joined.canonicalize() {
        Ok(canonical) if canonical.starts_with(root) => Ok(canonical),
        Ok(_) => Err(traversal(path, "Path resolves outside the sandbox")),
        Err(e) if e.kind() == ErrorKind::NotFound => verify_ancestors(root, joined),
        Err(e) => Err(StorageError::Io { source: e, context: Some("Path resolution failed".into()) }),
    }
}

/// For a path that does not exist yet, the closest existing ancestor must be inside
/// the sandbox.
fn verify_ancestors(root: &Path, joined: PathBuf) -> Result<PathBuf, StorageError> {
    let mut current = joined.parent();

    while let Some(dir) = current {
        if dir == root {
            return Ok(joined);
        }
        if dir.exists() {
            let canonical = dir.canonicalize().map_err(|e| StorageError::Io {
                source: e,
                context: Some("Failed to verify parent directory".into()),
            })?;
            return if canonical.starts_with(root) {
                Ok(joined)
            } else {
                Err(traversal(dir, "Existing parent directory is a symlink outside sandbox"))
            };
        }
        current = dir.parent();
    }

    Err(traversal(&joined, "No valid parent directory found within sandbox"))
}

/// Two shard levels from the first four characters of the file name.
pub(crate) fn shard_dirs(file_name: &str) -> Option<(String, String)> {
    let mut chars = file_name.chars();
    let first: String = chars.by_ref().take(2).collect();
    let second: String = chars.take(2).collect();
    (second.chars().count() == 2).then_some((first, second))
}

/// Resolves `<namespace>/<parent dirs>/<s1>/<s2>/<file>` inside the sandbox.
pub(crate) fn resolve_sharded(
    root: &Path,
    namespace: Option<&str>,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();
    let file_name = path.file_name().and_then(|s| s.to_str()).ok_or_else(|| {
        StorageError::FileNotFound {
            message: path.display().to_string().into(),
            context: Some("Target must be a file".into()),
        }
    })?;

    let mut sharded = PathBuf::new();
    if let Some(namespace) = namespace {
        sharded.push(namespace);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        sharded.push(parent);
    }
    if let Some((first, second)) = shard_dirs(file_name) {
        sharded.push(first);
        sharded.push(second);
    }
    sharded.push(file_name);

    resolve_path(root, sharded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_rejects_escapes() {
        assert!(normalize_relative(Path::new("../etc/passwd")).is_err());
        assert!(normalize_relative(Path::new("a/../../b")).is_err());
        assert!(normalize_relative(Path::new("/etc/passwd")).is_err());
        assert_eq!(normalize_relative(Path::new("a/./b/../c")).unwrap(), PathBuf::from("a/c"));
    }

    #[test]
    fn short_names_are_not_sharded() {
        assert_eq!(shard_dirs("abc"), None);
        assert_eq!(shard_dirs("abcd.png"), Some(("ab".to_owned(), "cd".to_owned())));
    }
}
