use std::{
    cmp::Ordering,
    collections::{btree_map, BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use crate::owner::Owner;

/// Owners that could review each object needing coverage, with the distance
/// from the object to the OWNERS entry granting them. A distance of 1 means
/// the object itself carries the grant, 2 its parent directory, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateMap {
    owners: BTreeMap<Owner, Vec<(PathBuf, usize)>>,
}

impl CandidateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` can cover `dir` at `distance`. If the owner is
    /// already recorded for `dir` only the closest distance is kept.
    pub fn insert(&mut self, owner: Owner, dir: impl Into<PathBuf>, distance: usize) {
        let dir = dir.into();
        let entries = self.owners.entry(owner).or_default();
        match entries.iter_mut().find(|(d, _)| *d == dir) {
            Some((_, existing)) => *existing = (*existing).min(distance),
            None => entries.push((dir, distance)),
        }
    }

    pub fn get(&self, owner: &Owner) -> Option<&[(PathBuf, usize)]> {
        self.owners.get(owner).map(Vec::as_slice)
    }

    /// The distance at which `owner` covers `dir`, if at all.
    pub fn distance(&self, owner: &Owner, dir: &Path) -> Option<usize> {
        self.get(owner)?
            .iter()
            .find(|(d, _)| d == dir)
            .map(|&(_, distance)| distance)
    }

    /// All owners covering `dir`, with their distances, in owner order.
    pub fn owners_of<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (&'a Owner, usize)> + 'a {
        self.owners
            .iter()
            .filter_map(move |(owner, _)| self.distance(owner, dir).map(|d| (owner, d)))
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Owner, Vec<(PathBuf, usize)>> {
        self.owners.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }
}

impl<P: Into<PathBuf>> FromIterator<(Owner, Vec<(P, usize)>)> for CandidateMap {
    fn from_iter<I: IntoIterator<Item = (Owner, Vec<(P, usize)>)>>(iter: I) -> Self {
        let mut map = CandidateMap::new();
        for (owner, dirs) in iter {
            for (dir, distance) in dirs {
                map.insert(owner.clone(), dir, distance);
            }
        }
        map
    }
}

/// How [`lowest_cost_owner`] ranks candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionStrategy {
    /// Minimize `total_distance / covered_count ^ exponent`. With the default
    /// exponent of 1.75 one owner in a parent directory beats three owners in
    /// subdirectories, but not two.
    ScaledCost { exponent: f64 },
    /// Maximize the number of covered directories, then minimize the total
    /// distance over them.
    CoverageFirst,
}

impl SelectionStrategy {
    pub const DEFAULT_EXPONENT: f64 = 1.75;
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::ScaledCost {
            exponent: Self::DEFAULT_EXPONENT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Score {
    covered: usize,
    total_distance: usize,
}

impl Score {
    fn cost(&self, exponent: f64) -> f64 {
        self.total_distance as f64 / (self.covered as f64).powf(exponent)
    }

    // `Less` means `self` is the better choice.
    fn compare(&self, other: &Score, strategy: SelectionStrategy) -> Ordering {
        match strategy {
            SelectionStrategy::ScaledCost { exponent } => self
                .cost(exponent)
                .partial_cmp(&other.cost(exponent))
                .unwrap_or(Ordering::Equal),
            SelectionStrategy::CoverageFirst => other
                .covered
                .cmp(&self.covered)
                .then(self.total_distance.cmp(&other.total_distance)),
        }
    }
}

/// Pick the owner who covers the most of `dirs` most cheaply, according to
/// `strategy`. Only owners covering at least one of `dirs` are considered;
/// returns `None` if there are none.
///
/// Any owner scoring equal to the best is an acceptable answer. This picks
/// the smallest such owner so repeated runs agree.
pub fn lowest_cost_owner<'a>(
    candidates: &'a CandidateMap,
    dirs: &BTreeSet<PathBuf>,
    strategy: SelectionStrategy,
) -> Option<&'a Owner> {
    let mut best: Option<(&Owner, Score)> = None;
    for (owner, entries) in candidates.iter() {
        let mut score = Score {
            covered: 0,
            total_distance: 0,
        };
        for (dir, distance) in entries {
            if dirs.contains(dir) {
                score.covered += 1;
                score.total_distance += distance;
            }
        }
        if score.covered == 0 {
            continue;
        }

        tracing::trace!(
            %owner,
            covered = score.covered,
            total_distance = score.total_distance,
            "scored candidate"
        );

        // Candidates iterate in owner order, so only a strictly better score
        // replaces the current best.
        let better = match &best {
            None => true,
            Some((_, best_score)) => score.compare(best_score, strategy) == Ordering::Less,
        };
        if better {
            best = Some((owner, score));
        }
    }
    best.map(|(owner, _)| owner)
}
