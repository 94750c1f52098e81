use std::{
    collections::{btree_map, BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use crate::{
    database::{check_paths, enclosing_index, Database},
    error::Result,
    owner::Owner,
    repo::RepoAccess,
};

/// Suggested reviewers for a changeset, each with the owners who could have
/// stood in for them and the OWNERS comment labels explaining why they were
/// picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerSet {
    reviewers: BTreeMap<Owner, Reviewer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reviewer {
    /// Owners equally close to at least one of this reviewer's files who
    /// weren't suggested themselves.
    pub alternates: BTreeSet<Owner>,
    /// Comment label of the OWNERS file that made this reviewer eligible,
    /// mapped to the files it was picked for, in the order they were added.
    pub comments: BTreeMap<String, Vec<PathBuf>>,
}

impl Reviewer {
    fn add_comment(&mut self, label: &str, file: &Path) {
        let files = self.comments.entry(label.to_owned()).or_default();
        if !files.iter().any(|f| f == file) {
            files.push(file.to_path_buf());
        }
    }
}

impl ReviewerSet {
    pub fn get(&self, owner: &Owner) -> Option<&Reviewer> {
        self.reviewers.get(owner)
    }

    pub fn contains(&self, owner: &Owner) -> bool {
        self.reviewers.contains_key(owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = &Owner> {
        self.reviewers.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Owner, Reviewer> {
        self.reviewers.iter()
    }

    pub fn len(&self) -> usize {
        self.reviewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty()
    }
}

impl<'a> IntoIterator for &'a ReviewerSet {
    type Item = (&'a Owner, &'a Reviewer);
    type IntoIter = btree_map::Iter<'a, Owner, Reviewer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: RepoAccess> Database<R> {
    /// Like [`Database::reviewers_for`], but records for each suggested
    /// reviewer which equally close owners could have stood in, and the
    /// comment labels of the OWNERS files they were chosen from.
    ///
    /// Files anyone may approve need no reviewer and are left out.
    pub fn reviewer_set_for<P>(
        &mut self,
        files: impl IntoIterator<Item = P>,
        author: &str,
    ) -> Result<ReviewerSet>
    where
        P: AsRef<Path>,
    {
        let files = check_paths(files)?;
        self.load_data_needed_for(&files)?;

        let nobody = BTreeSet::new();
        let files: Vec<PathBuf> = files
            .into_iter()
            .filter(|file| !self.is_covered_by(file, &nobody))
            .collect();
        let (suggested, candidates) = self.covering_set_of_owners_for(&files, Some(author));

        let mut set = ReviewerSet::default();
        for file in &files {
            let chain = self.chain(file);
            let start = enclosing_index(&chain);
            let enclosing = chain[start].path;

            // The closest suggested owner reviews this file
            let chosen = suggested
                .iter()
                .filter_map(|owner| candidates.distance(owner, enclosing).map(|d| (d, owner)))
                .min();
            let Some((distance, owner)) = chosen else {
                tracing::debug!(file = %file.display(), "no reviewer for file");
                continue;
            };

            let reviewer = set.reviewers.entry(owner.clone()).or_default();
            reviewer.alternates.extend(
                candidates
                    .owners_of(enclosing)
                    .filter(|&(other, d)| d == distance && !suggested.contains(other))
                    .map(|(other, _)| other.clone()),
            );
            if let Some(label) = chain[start + distance - 1].comment {
                reviewer.add_comment(label, file);
            }
        }
        Ok(set)
    }
}
