use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Collapses `.`/`..` lexically; fails if the path climbs above its own base.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir if out.pop() => {},
            Component::ParentDir => {
                return Err(traversal(path, "path climbs above the sandbox root"));
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(path, "absolute paths are not allowed"));
            },
        }
    }

    if out.as_os_str().is_empty() {
        return Err(traversal(path, "path resolves to the sandbox root itself"));
    }

    Ok(out)
}

/// Joins `path` under `root` (and the optional namespace directory) and proves the result,
/// or its nearest existing ancestor, canonicalizes inside `root`.
pub(crate) fn resolve(
    root: &Path,
    namespace: Option<&str>,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StorageError> {
    let relative = normalize_relative(path.as_ref())?;
    let joined = namespace.map_or_else(|| root.to_path_buf(), |ns| root.join(ns)).join(relative);

    let mut cursor = Some(joined.as_path());
    while let Some(candidate) = cursor {
        if candidate == root {
            return Ok(joined);
        }
        match candidate.canonicalize() {
            Ok(canonical) if canonical.starts_with(root) => return Ok(joined),
            Ok(canonical) => {
                return Err(traversal(&canonical, "symlink points outside the sandbox"));
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => cursor = candidate.parent(),
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("cannot verify {}", candidate.display()).into()),
                });
            },
        }
    }

    Err(traversal(&joined, "no ancestor inside the sandbox"))
}

fn traversal(path: &Path, reason: &'static str) -> StorageError {
    StorageError::PathTraversalAttempt {
        message: path.display().to_string().into(),
        context: Some(reason.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_paths_inside_base() {
        assert_eq!(normalize_relative(Path::new("a/./b/../c.bin")).unwrap(), Path::new("a/c.bin"));
        assert!(normalize_relative(Path::new("../vault.bin")).is_err());
        assert!(normalize_relative(Path::new("a/../../vault.bin")).is_err());
        assert!(normalize_relative(Path::new("/etc/passwd")).is_err());
        assert!(normalize_relative(Path::new(".")).is_err());
    }
}
