use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use crate::glob::FileGlob;

/// Access to the tree the OWNERS files live in. The database never touches
/// the filesystem directly, which keeps it testable against [`MemoryRepo`].
///
/// All paths passed in are full paths: the database's root joined with a
/// root-relative path.
pub trait RepoAccess {
    /// Read a file's contents as text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries directly inside `dir` whose file name matches `glob`.
    /// A missing directory yields no entries.
    fn glob(&self, dir: &Path, glob: &FileGlob) -> io::Result<Vec<PathBuf>>;
}

impl<T: RepoAccess + ?Sized> RepoAccess for &T {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn glob(&self, dir: &Path, glob: &FileGlob) -> io::Result<Vec<PathBuf>> {
        (**self).glob(dir, glob)
    }
}

/// [`RepoAccess`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRepo;

impl RepoAccess for FsRepo {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn glob(&self, dir: &Path, glob: &FileGlob) -> io::Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let is_match = entry
                .file_name()
                .to_str()
                .map(|name| glob.is_match(name))
                .unwrap_or(false);
            if is_match {
                matches.push(entry.into_path());
            }
        }
        matches.sort();
        Ok(matches)
    }
}

/// An in-memory tree of files keyed by full path. Directories exist
/// implicitly as the ancestors of files.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }
}

impl<P: Into<PathBuf>, S: Into<String>> FromIterator<(P, S)> for MemoryRepo {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut repo = MemoryRepo::new();
        for (path, contents) in iter {
            repo.insert(path, contents);
        }
        repo
    }
}

impl RepoAccess for MemoryRepo {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file", path.display()),
            )
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn glob(&self, dir: &Path, glob: &FileGlob) -> io::Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(dir) else {
                continue;
            };
            // A direct child is matched by name; a deeper file contributes
            // its top-level directory as an entry.
            let Some(first) = rest.iter().next() else {
                continue;
            };
            let entry = dir.join(first);
            if matches.last() == Some(&entry) {
                continue;
            }
            if first.to_str().map(|name| glob.is_match(name)).unwrap_or(false) {
                matches.push(entry);
            }
        }
        matches.dedup();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> MemoryRepo {
        MemoryRepo::from_iter([
            ("/OWNERS", "*\n"),
            ("/content/baz/OWNERS", "brett@example.com\n"),
            ("/content/baz/froboz.h", ""),
            ("/content/baz/ugly.cc", ""),
            ("/content/baz/ugly.h", ""),
            ("/content/baz/sub/ugly.x", ""),
        ])
    }

    #[test]
    fn test_memory_repo_files() {
        let repo = test_repo();
        assert!(repo.is_file(Path::new("/OWNERS")));
        assert!(!repo.is_file(Path::new("/content/OWNERS")));
        assert!(repo.is_dir(Path::new("/content")));
        assert!(repo.is_dir(Path::new("/content/baz")));
        assert!(!repo.is_dir(Path::new("/content/baz/ugly.cc")));
        assert_eq!(repo.read_to_string(Path::new("/OWNERS")).unwrap(), "*\n");
        assert_eq!(
            repo.read_to_string(Path::new("/missing")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_memory_repo_glob() {
        let repo = test_repo();
        let glob = FileGlob::new("ugly.*").unwrap();
        assert_eq!(
            repo.glob(Path::new("/content/baz"), &glob).unwrap(),
            vec![
                PathBuf::from("/content/baz/ugly.cc"),
                PathBuf::from("/content/baz/ugly.h")
            ]
        );

        let glob = FileGlob::new("*").unwrap();
        assert_eq!(
            repo.glob(Path::new("/content"), &glob).unwrap(),
            vec![PathBuf::from("/content/baz")]
        );
        assert!(repo.glob(Path::new("/nope"), &glob).unwrap().is_empty());
    }

    #[test]
    fn test_fs_repo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("baz")).unwrap();
        std::fs::write(dir.path().join("baz/ugly.cc"), "").unwrap();
        std::fs::write(dir.path().join("baz/ugly.h"), "").unwrap();
        std::fs::write(dir.path().join("baz/froboz.h"), "").unwrap();
        std::fs::write(dir.path().join("baz/OWNERS"), "brett@example.com\n").unwrap();

        let repo = FsRepo;
        let baz = dir.path().join("baz");
        assert!(repo.is_dir(&baz));
        assert!(repo.is_file(&baz.join("OWNERS")));
        assert!(!repo.is_file(&baz));
        assert_eq!(
            repo.read_to_string(&baz.join("OWNERS")).unwrap(),
            "brett@example.com\n"
        );

        let glob = FileGlob::new("ugly.*").unwrap();
        assert_eq!(
            repo.glob(&baz, &glob).unwrap(),
            vec![baz.join("ugly.cc"), baz.join("ugly.h")]
        );
        assert!(repo.glob(&dir.path().join("missing"), &glob).unwrap().is_empty());
    }
}
