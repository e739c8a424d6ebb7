use crate::error::{BuildError, Result};
use crate::utils::fs as ufs;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

/// Highest standard deflate level.
const DEFLATE_LEVEL: i32 = 9;

/// Outcome of [`create_bundle`].
#[derive(Debug, Clone, PartialEq)]
pub struct BundleReport {
    pub path: PathBuf,
    /// Archive entry names, in the order they were written.
    pub entries: Vec<String>,
    pub excluded: Vec<String>,
}

/// Lists the archive entry names for a staged tree: every file's
/// root-relative `/`-separated path, minus exact matches in `excluded`.
/// The result is sorted so identical trees produce identical archives.
///
/// ### Parameters
/// - `root`: The staged tree
/// - `excluded`: Archive-relative paths to leave out
/// - `skip`: A file to never include (the bundle itself when it lives inside `root`)
///
pub fn collect_entries(
    root: &Path,
    excluded: &[String],
    skip: Option<&Path>,
) -> Result<(Vec<(String, PathBuf)>, Vec<String>)> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    for p in ufs::walk_files(root)? {
        if skip.is_some_and(|s| s == p.as_path()) {
            continue;
        }
        let Some(rel) = ufs::path_relative_to(&p, root) else {
            continue;
        };
        let name = ufs::to_unix_string(&rel);
        if excluded.contains(name.as_str()) {
            skipped.push(name);
        } else {
            entries.push((name, p));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    skipped.sort();
    Ok((entries, skipped))
}

/// Writes the staged tree to a deflate-compressed ZIP at `out_file`,
/// replacing any previous archive there.
///
/// ### Parameters
/// - `root`: The staged tree
/// - `excluded`: Archive-relative paths to leave out
/// - `out_file`: The bundle path
///
pub fn create_bundle(root: &Path, excluded: &[String], out_file: &Path) -> Result<BundleReport> {
    if !root.is_dir() {
        return Err(BuildError::Config(format!(
            "Add-on directory not found: {}",
            root.display()
        )));
    }
    ufs::remove_if_exists(out_file)?;
    if let Some(parent) = out_file.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BuildError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    let out_abs = fs::canonicalize(out_file.parent().unwrap_or(Path::new(".")))
        .ok()
        .and_then(|dir| out_file.file_name().map(|f| dir.join(f)));
    let root_abs = fs::canonicalize(root)
        .map_err(|e| BuildError::io(format!("Failed to resolve {}", root.display()), e))?;
    let (entries, excluded) = collect_entries(&root_abs, excluded, out_abs.as_deref())?;

    let archive_err = |source| BuildError::Archive {
        path: out_file.to_path_buf(),
        source,
    };

    let file = fs::File::create(out_file)
        .map_err(|e| BuildError::io(format!("Failed to create {}", out_file.display()), e))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(DEFLATE_LEVEL));

    let mut names = Vec::with_capacity(entries.len());
    for (name, path) in entries {
        zip.start_file(name.as_str(), options).map_err(archive_err)?;
        let mut src = fs::File::open(&path)
            .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
        io::copy(&mut src, &mut zip)
            .map_err(|e| BuildError::io(format!("Failed to write {} to archive", name), e))?;
        names.push(name);
    }
    zip.finish().map_err(archive_err)?;

    Ok(BundleReport {
        path: out_file.to_path_buf(),
        entries: names,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Read;

    fn stage(root: &Path, files: &[(&str, &str)]) {
        for (rel, contents) in files {
            let p = root.join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, contents).unwrap();
        }
    }

    fn archive_names(path: &Path) -> BTreeSet<String> {
        let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn archives_tree_minus_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let addon = dir.path().join("addon");
        stage(
            &addon,
            &[
                ("manifest.ini", "name = x\n"),
                ("globalPlugins/CaptionLocal/__init__.py", "# plugin\n"),
                ("globalPlugins/CaptionLocal/models/.keep", ""),
                ("locale/fr/manifest.ini", "summary = \"x\"\n"),
                ("doc/en/readme.md", "help\n"),
            ],
        );
        let excluded = vec![
            "globalPlugins/CaptionLocal/models/.keep".to_string(),
            "doc/en/readme.md".to_string(),
            "not/there.txt".to_string(),
        ];
        let out = dir.path().join("x-1.0.nvda-addon");

        let report = create_bundle(&addon, &excluded, &out).unwrap();

        let expected: BTreeSet<String> = [
            "manifest.ini",
            "globalPlugins/CaptionLocal/__init__.py",
            "locale/fr/manifest.ini",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(archive_names(&out), expected);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(
            report.excluded,
            vec![
                "doc/en/readme.md".to_string(),
                "globalPlugins/CaptionLocal/models/.keep".to_string()
            ]
        );
    }

    #[test]
    fn entries_are_relative_and_deflated() {
        let dir = tempfile::tempdir().unwrap();
        let addon = dir.path().join("addon");
        let body = "caption ".repeat(512);
        stage(&addon, &[("sub/dir/file.txt", body.as_str())]);
        let out = dir.path().join("out.nvda-addon");

        create_bundle(&addon, &[], &out).unwrap();

        let mut archive = zip::ZipArchive::new(fs::File::open(&out).unwrap()).unwrap();
        let mut entry = archive.by_name("sub/dir/file.txt").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        assert_eq!(text, body);
    }

    #[test]
    fn identical_trees_give_identical_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let addon = dir.path().join("addon");
        stage(&addon, &[("b.txt", "b"), ("a/z.txt", "z"), ("a.txt", "a")]);

        let (first, _) = collect_entries(&addon, &[], None).unwrap();
        let names: Vec<&str> = first.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "a/z.txt", "b.txt"]);
    }

    #[test]
    fn bundle_inside_tree_is_not_archived() {
        let dir = tempfile::tempdir().unwrap();
        let addon = dir.path().join("addon");
        stage(&addon, &[("manifest.ini", "x")]);
        let out = addon.join("self.nvda-addon");

        create_bundle(&addon, &[], &out).unwrap();
        create_bundle(&addon, &[], &out).unwrap();

        let names = archive_names(&out);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["manifest.ini"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_bundle(&dir.path().join("addon"), &[], &dir.path().join("o.zip"))
            .unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }
}
