use crate::config::build_vars::BUILD_VARS_FILE;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Returns the current working directory.
pub fn get_cwd() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns true if the given directory holds an add-on project.
pub fn is_project_root(dir: &Path) -> bool {
    dir.join(BUILD_VARS_FILE).is_file()
}

/// Walks upward from `start` to locate the first add-on project root.
pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|ancestor| is_project_root(ancestor))
        .map(Path::to_path_buf)
}

/// Resolves the project root: an explicit directory wins, otherwise the
/// nearest ancestor of the working directory carrying `buildVars.toml`.
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf, String> {
    let cwd = get_cwd();
    if let Some(dir) = explicit {
        let dir = cwd.join(dir);
        if is_project_root(&dir) {
            return Ok(dir);
        }
        return Err(format!(
            "Invalid project: {} (no {} found)",
            dir.to_string_lossy(),
            BUILD_VARS_FILE
        ));
    }
    find_project_root_from(&cwd).ok_or_else(|| {
        format!(
            "No {} found in {} or any parent directory",
            BUILD_VARS_FILE,
            cwd.to_string_lossy()
        )
    })
}
