use crate::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Collects every regular file below `root`. Order is unspecified.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(dir) = stack.pop() {
        let rd = fs::read_dir(&dir)
            .map_err(|e| BuildError::io(format!("Failed to read directory {}", dir.display()), e))?;
        for entry in rd {
            let entry = entry.map_err(|e| {
                BuildError::io(format!("Failed to read entry in {}", dir.display()), e)
            })?;
            let p = entry.path();
            if p.is_dir() {
                stack.push(p);
            } else if p.is_file() {
                files.push(p);
            }
        }
    }
    Ok(files)
}

pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_path_buf())
}

pub fn to_unix_string<P: AsRef<Path>>(p: P) -> String {
    let s = p.as_ref().to_string_lossy().into_owned();
    s.replace('\\', "/")
}

/// Copies `from` to `to`, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to).map_err(|e| {
        BuildError::io(
            format!("Failed to copy {} to {}", from.display(), to.display()),
            e,
        )
    })?;
    Ok(())
}

/// Writes a text file, creating the parent directories.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents)
        .map_err(|e| BuildError::io(format!("Failed to write {}", path.display()), e))
}

/// Removes a file if present. Returns whether something was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path)
        .map_err(|e| BuildError::io(format!("Failed to remove {}", path.display()), e))?;
    Ok(true)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BuildError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }
    Ok(())
}
