use std::path::{Path, PathBuf};

/// Absolute, symlink-free form of `path` for identity comparisons.
///
/// Existing paths are canonicalized. For a path that does not exist yet
/// (an output or intermediate file), the parent directory is canonicalized
/// and the file name appended.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
        _ => absolute,
    }
}

/// True when both spellings name the same file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    resolve_path(a) == resolve_path(b)
}
