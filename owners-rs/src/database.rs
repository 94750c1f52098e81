use std::{
    collections::{BTreeSet, HashMap},
    path::{Component, Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    owner::Owner,
    parser::{self, DirectiveSet},
    repo::RepoAccess,
    selector::{lowest_cost_owner, CandidateMap, SelectionStrategy},
};

pub const DEFAULT_OWNERS_FILE_NAME: &str = "OWNERS";

static NO_OWNERS: BTreeSet<Owner> = BTreeSet::new();

/// Resolves ownership for files under `root` by reading the OWNERS file in
/// each directory on the way from a file up to the root.
///
/// OWNERS files are loaded lazily, the first time a query needs them, and
/// cached for the life of the `Database`. The cache is never invalidated, so
/// build a new `Database` if the tree may have changed.
///
/// All file paths passed to queries must be relative to `root`.
pub struct Database<R> {
    root: PathBuf,
    repo: R,
    owners_file_name: String,
    strategy: SelectionStrategy,
    // `None` records that the directory has no OWNERS file
    dirs: HashMap<PathBuf, Option<OwnersDir>>,
}

/// A parsed OWNERS file, with its `per-file` rules resolved to the files in
/// the directory they match.
#[derive(Debug, Clone)]
pub(crate) struct OwnersDir {
    directives: DirectiveSet,
    per_file: HashMap<PathBuf, FileGrant>,
}

#[derive(Debug, Clone, Default)]
struct FileGrant {
    owners: BTreeSet<Owner>,
    no_parent: bool,
}

/// One step on the way from a file up to the root: either the file itself
/// (when a `per-file` rule matched it) or one of its ancestor directories.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link<'a> {
    pub(crate) path: &'a Path,
    pub(crate) owners: &'a BTreeSet<Owner>,
    pub(crate) no_parent: bool,
    pub(crate) comment: Option<&'a str>,
}

impl Link<'_> {
    fn grants_any(&self, reviewers: &BTreeSet<Owner>) -> bool {
        self.owners
            .iter()
            .any(|owner| owner.is_everyone() || reviewers.contains(owner))
    }
}

/// Builder for a [`Database`]. Calling [`DatabaseBuilder::build`] will
/// consume the builder.
pub struct DatabaseBuilder<R> {
    root: PathBuf,
    repo: R,
    owners_file_name: String,
    strategy: SelectionStrategy,
}

impl<R: RepoAccess> DatabaseBuilder<R> {
    /// Name of the declaration file looked up in each directory. Defaults to
    /// `OWNERS`.
    pub fn owners_file_name(mut self, name: impl Into<String>) -> Self {
        self.owners_file_name = name.into();
        self
    }

    /// How reviewers are ranked when suggesting. Defaults to
    /// [`SelectionStrategy::ScaledCost`] with an exponent of 1.75.
    pub fn strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Database<R> {
        Database {
            root: self.root,
            repo: self.repo,
            owners_file_name: self.owners_file_name,
            strategy: self.strategy,
            dirs: HashMap::new(),
        }
    }
}

impl<R: RepoAccess> Database<R> {
    /// Create a database with the default options.
    pub fn new(root: impl Into<PathBuf>, repo: R) -> Self {
        Self::builder(root, repo).build()
    }

    pub fn builder(root: impl Into<PathBuf>, repo: R) -> DatabaseBuilder<R> {
        DatabaseBuilder {
            root: root.into(),
            repo,
            owners_file_name: DEFAULT_OWNERS_FILE_NAME.to_owned(),
            strategy: SelectionStrategy::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Return the subset of `files` that none of `reviewers` can approve.
    ///
    /// A file is covered if some OWNERS entry on its chain, from a matching
    /// `per-file` rule up through each ancestor directory until a
    /// `set noparent`, names one of the reviewers or the wildcard `*`.
    pub fn files_not_covered_by<P, S>(
        &mut self,
        files: impl IntoIterator<Item = P>,
        reviewers: impl IntoIterator<Item = S>,
    ) -> Result<BTreeSet<PathBuf>>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let files = check_paths(files)?;
        let reviewers = check_reviewers(reviewers)?;
        self.load_data_needed_for(&files)?;

        Ok(files
            .into_iter()
            .filter(|file| !self.is_covered_by(file, &reviewers))
            .collect())
    }

    /// Suggest a small set of reviewers who together can approve every file.
    /// `author` is never suggested.
    ///
    /// The result is the wildcard alone if anyone may approve everything.
    /// When several owners are equally good the choice between them is
    /// arbitrary; callers should accept any of them.
    pub fn reviewers_for<P>(
        &mut self,
        files: impl IntoIterator<Item = P>,
        author: Option<&str>,
    ) -> Result<BTreeSet<Owner>>
    where
        P: AsRef<Path>,
    {
        let files = check_paths(files)?;
        self.load_data_needed_for(&files)?;

        let (mut suggested, _) = self.covering_set_of_owners_for(&files, author);
        if suggested.len() > 1 {
            suggested.remove(&Owner::Everyone);
        }
        Ok(suggested)
    }

    /// For each owner who could review any of `files`, the objects (enclosing
    /// owned directories, or individual files with `per-file` rules) they can
    /// cover and at what distance. `author` is left out.
    pub fn candidates_for<P>(
        &mut self,
        files: impl IntoIterator<Item = P>,
        author: Option<&str>,
    ) -> Result<CandidateMap>
    where
        P: AsRef<Path>,
    {
        let files = check_paths(files)?;
        self.load_data_needed_for(&files)?;
        Ok(self.all_possible_owners(&files, author).1)
    }

    pub(crate) fn is_covered_by(&self, file: &Path, reviewers: &BTreeSet<Owner>) -> bool {
        self.chain(file)
            .iter()
            .any(|link| link.grants_any(reviewers))
    }

    // Greedily pick the lowest cost owner until every enclosing object is
    // covered. Objects no candidate can cover are left out.
    pub(crate) fn covering_set_of_owners_for<'a>(
        &self,
        files: impl IntoIterator<Item = &'a PathBuf>,
        author: Option<&str>,
    ) -> (BTreeSet<Owner>, CandidateMap) {
        let (mut dirs_remaining, candidates) = self.all_possible_owners(files, author);
        let mut suggested = BTreeSet::new();
        while !dirs_remaining.is_empty() {
            let Some(owner) = lowest_cost_owner(&candidates, &dirs_remaining, self.strategy)
            else {
                tracing::warn!(dirs = ?dirs_remaining, "no eligible owner");
                break;
            };
            if let Some(entries) = candidates.get(owner) {
                for (dir, _) in entries {
                    dirs_remaining.remove(dir);
                }
            }
            tracing::debug!(%owner, remaining = dirs_remaining.len(), "suggested owner");
            suggested.insert(owner.clone());
        }
        (suggested, candidates)
    }

    fn all_possible_owners<'a>(
        &self,
        files: impl IntoIterator<Item = &'a PathBuf>,
        author: Option<&str>,
    ) -> (BTreeSet<PathBuf>, CandidateMap) {
        let mut dirs = BTreeSet::new();
        let mut candidates = CandidateMap::new();
        for file in files {
            let chain = self.chain(file);
            let start = enclosing_index(&chain);
            let enclosing = chain[start].path;
            // Every file under the same enclosing object shares its chain
            if !dirs.insert(enclosing.to_path_buf()) {
                continue;
            }
            for (idx, link) in chain[start..].iter().enumerate() {
                for owner in link.owners {
                    if author.map_or(false, |author| owner == author) {
                        continue;
                    }
                    candidates.insert(owner.clone(), enclosing, idx + 1);
                }
            }
        }
        (dirs, candidates)
    }

    /// The links from `file` up to the root, ending early after the first
    /// link that carries `set noparent`. Directories that haven't been
    /// loaded contribute no owners.
    pub(crate) fn chain<'a>(&'a self, file: &'a Path) -> Vec<Link<'a>> {
        let mut links = Vec::new();

        let parent = file.parent().and_then(|dir| self.loaded(dir));
        if let Some((dir, grant)) = parent.and_then(|dir| dir.per_file.get(file).map(|g| (dir, g))) {
            links.push(Link {
                path: file,
                owners: &grant.owners,
                no_parent: grant.no_parent,
                comment: dir.directives.comment.as_deref(),
            });
            if grant.no_parent {
                return links;
            }
        }

        for dir in file.ancestors().skip(1) {
            let link = match self.loaded(dir) {
                Some(entry) => Link {
                    path: dir,
                    owners: &entry.directives.owners,
                    no_parent: entry.directives.no_parent,
                    comment: entry.directives.comment.as_deref(),
                },
                None => Link {
                    path: dir,
                    owners: &NO_OWNERS,
                    no_parent: false,
                    comment: None,
                },
            };
            links.push(link);
            if link.no_parent {
                break;
            }
        }
        links
    }

    fn loaded(&self, dir: &Path) -> Option<&OwnersDir> {
        self.dirs.get(dir).and_then(Option::as_ref)
    }

    // Whether resolving `file` needs nothing above `dir`.
    fn stops_at(&self, dir: &Path, file: &Path) -> bool {
        match self.loaded(dir) {
            Some(entry) => {
                entry.directives.no_parent
                    || entry.per_file.get(file).map_or(false, |grant| grant.no_parent)
            }
            None => false,
        }
    }

    pub(crate) fn load_data_needed_for(&mut self, files: &BTreeSet<PathBuf>) -> Result<()> {
        self.load_with(files, |db, dir| db.read_owners_dir(dir))
    }

    // Walk each file's ancestors, loading any directory not yet cached, and
    // stop where a `set noparent` makes the rest irrelevant.
    fn load_with<F>(&mut self, files: &BTreeSet<PathBuf>, mut fetch: F) -> Result<()>
    where
        F: FnMut(&Self, &Path) -> Result<Option<OwnersDir>>,
    {
        for file in files {
            for dir in file.ancestors().skip(1) {
                if !self.dirs.contains_key(dir) {
                    let entry = fetch(&*self, dir)?;
                    self.dirs.insert(dir.to_path_buf(), entry);
                }
                if self.stops_at(dir, file) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn read_owners_dir(&self, dir: &Path) -> Result<Option<OwnersDir>> {
        let dir_path = self.root.join(dir);
        let owners_path = dir_path.join(&self.owners_file_name);
        if !self.repo.is_file(&owners_path) {
            tracing::debug!(dir = %dir.display(), path = %owners_path.display(), "no owners file");
            return Ok(None);
        }

        let source = self
            .repo
            .read_to_string(&owners_path)
            .map_err(|err| Error::io(&owners_path, err))?;
        let directives = parser::parse(&source)
            .into_result()
            .map_err(|err| Error::Syntax {
                path: owners_path.clone(),
                line: err.line,
                message: err.message,
            })?;

        let mut per_file: HashMap<PathBuf, FileGrant> = HashMap::new();
        for rule in &directives.per_file {
            let matches = self
                .repo
                .glob(&dir_path, &rule.glob)
                .map_err(|err| Error::io(&dir_path, err))?;
            for matched in matches {
                let Ok(relative) = matched.strip_prefix(&self.root) else {
                    continue;
                };
                let grant = per_file.entry(relative.to_path_buf()).or_default();
                grant.owners.extend(rule.owners.iter().cloned());
                grant.no_parent |= rule.no_parent;
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            path = %owners_path.display(),
            owners = directives.owners.len(),
            per_file = per_file.len(),
            no_parent = directives.no_parent,
            "loaded owners file"
        );
        Ok(Some(OwnersDir {
            directives,
            per_file,
        }))
    }
}

#[cfg(feature = "rayon")]
impl<R: RepoAccess + Sync> Database<R> {
    /// Read and parse the OWNERS files `files` will need in parallel. Queries
    /// afterwards see exactly what lazy loading would have produced: files
    /// that lazy loading wouldn't reach are dropped, along with their errors.
    pub fn preload<P>(&mut self, files: impl IntoIterator<Item = P>) -> Result<()>
    where
        P: AsRef<Path>,
    {
        use rayon::prelude::*;

        let files = check_paths(files)?;
        let pending: BTreeSet<PathBuf> = files
            .iter()
            .flat_map(|file| file.ancestors().skip(1))
            .filter(|dir| !self.dirs.contains_key(*dir))
            .map(Path::to_path_buf)
            .collect();

        let this = &*self;
        let mut parsed: HashMap<PathBuf, Result<Option<OwnersDir>>> = pending
            .into_par_iter()
            .map(|dir| {
                let entry = this.read_owners_dir(&dir);
                (dir, entry)
            })
            .collect();
        tracing::debug!(dirs = parsed.len(), "preloaded owners files");

        self.load_with(&files, |db, dir| {
            parsed
                .remove(dir)
                .unwrap_or_else(|| db.read_owners_dir(dir))
        })
    }
}

// The first link that names any owner, or the last link if none does.
pub(crate) fn enclosing_index(chain: &[Link<'_>]) -> usize {
    chain
        .iter()
        .position(|link| !link.owners.is_empty())
        .unwrap_or_else(|| chain.len().saturating_sub(1))
}

/// Normalize `files` into root-relative paths, rejecting absolute paths and
/// paths that escape the root.
pub(crate) fn check_paths<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
) -> Result<BTreeSet<PathBuf>> {
    files
        .into_iter()
        .map(|file| normalize(file.as_ref()))
        .collect()
}

fn normalize(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(Error::InvalidInput(format!(
                        "path escapes the root: {}",
                        path.display()
                    )));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidInput(format!(
                    "path is not relative to the root: {}",
                    path.display()
                )));
            }
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidInput(format!(
            "path does not name a file: {:?}",
            path
        )));
    }
    Ok(normalized)
}

pub(crate) fn check_reviewers<S: AsRef<str>>(
    reviewers: impl IntoIterator<Item = S>,
) -> Result<BTreeSet<Owner>> {
    reviewers
        .into_iter()
        .map(|reviewer| {
            let reviewer = reviewer.as_ref();
            Owner::parse(reviewer).ok_or_else(|| {
                Error::InvalidInput(format!("not an email address or \"*\": {:?}", reviewer))
            })
        })
        .collect()
}
