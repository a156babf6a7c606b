//! Exhaustive k-nearest-neighbour search over a sketch dataset

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::distance::{LocalCost, ABANDONED};
use crate::error::{KnnError, Result};
use crate::point::{Point, Sketch};
use crate::selector::BoundedMaxHeap;

/// What to do when more neighbours are requested than the dataset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KPolicy {
    /// Return every sketch of the dataset
    #[default]
    Clamp,
    /// Fail with [`KnnError::KExceedsDataset`]
    Reject,
}

/// Search settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub k: usize,
    pub cost: LocalCost,
    pub k_policy: KPolicy,
}

impl SearchConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn with_cost(mut self, cost: LocalCost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_k_policy(mut self, k_policy: KPolicy) -> Self {
        self.k_policy = k_policy;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 4,
            cost: LocalCost::MeanAbsolute,
            k_policy: KPolicy::Clamp,
        }
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Settings:")?;
        writeln!(f, "  k        : {}", self.k)?;
        writeln!(f, "  cost     : {:?}", self.cost)?;
        write!(f, "  k_policy : {:?}", self.k_policy)
    }
}

/// A dataset sketch kept among the k nearest, with its distance to the query.
#[derive(Debug)]
pub struct Neighbour<'a, L> {
    /// Position of the sketch in the dataset
    pub index: usize,
    pub sketch: &'a Sketch<L>,
    pub distance: f64,
}

impl<L> Clone for Neighbour<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for Neighbour<'_, L> {}

/// Counters describing how much work a search did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    /// Dataset sketches compared against the query
    pub scanned: usize,
    /// Distance computations cut short by the current k-th best
    pub abandoned: usize,
    /// Candidates that evicted the worst kept neighbour
    pub replaced: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scanned = self.scanned.max(1) as f64;
        writeln!(f, "Sketches scanned : {}", self.scanned)?;
        writeln!(
            f,
            "  Abandoned early : {:>7.4} %",
            self.abandoned as f64 / scanned * 100.0
        )?;
        write!(
            f,
            "  Replaced worst  : {:>7.4} %",
            self.replaced as f64 / scanned * 100.0
        )
    }
}

/// Outcome of a search: the kept neighbours (unordered) and scan statistics.
#[derive(Debug)]
pub struct SearchResult<'a, L> {
    pub neighbours: Vec<Neighbour<'a, L>>,
    pub stats: SearchStats,
    pub duration: Duration,
}

/// Linear-scan k-NN search using early-abandoning DTW.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnnSearch {
    config: SearchConfig,
}

impl KnnSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find the k sketches of `dataset` closest to `query`.
    ///
    /// Every sketch is compared in dataset order. Until k candidates are
    /// kept, distances are computed in full; afterwards the worst kept
    /// distance bounds each computation so hopeless candidates are
    /// abandoned early. The returned neighbours are in no particular order.
    ///
    /// Pruning starts only once k candidates are kept, so an abandoned
    /// distance never enters the selector.
    pub fn search<'a, L>(
        &self,
        dataset: &'a [Sketch<L>],
        query: &[Point],
    ) -> Result<SearchResult<'a, L>> {
        let k = self.effective_k(dataset.len())?;
        if query.is_empty() {
            return Err(KnnError::NoPoints);
        }

        debug!(
            "Searching {} sketches for the {} nearest to a {}-point query",
            dataset.len(),
            k,
            query.len()
        );
        let start = Instant::now();

        let mut selector = BoundedMaxHeap::with_capacity(k)?;
        let mut bound = ABANDONED;
        let mut stats = SearchStats::default();

        for (index, sketch) in dataset.iter().enumerate() {
            if sketch.is_empty() {
                return Err(KnnError::EmptySketch { index });
            }

            let distance = self.config.cost.dtw(sketch.points(), query, bound);
            stats.scanned += 1;

            if !selector.is_full() {
                selector.insert(distance, index)?;
                if selector.is_full() {
                    bound = selector.maximum_key()?;
                }
            } else if distance < bound {
                selector.replace_maximum(distance, index)?;
                bound = selector.maximum_key()?;
                stats.replaced += 1;
            } else if distance == ABANDONED {
                stats.abandoned += 1;
                trace!("Abandoned sketch {} against bound {}", index, bound);
            }
        }

        let mut neighbours = Vec::new();
        neighbours
            .try_reserve_exact(selector.len())
            .map_err(|_| KnnError::AllocationFailed {
                what: "search results",
                requested: selector.len(),
            })?;
        neighbours.extend(selector.as_slice().iter().map(|c| Neighbour {
            index: c.value,
            sketch: &dataset[c.value],
            distance: c.key,
        }));

        let duration = start.elapsed();
        debug!(
            "Search finished in {:?}: {} scanned, {} abandoned, {} replaced",
            duration, stats.scanned, stats.abandoned, stats.replaced
        );

        Ok(SearchResult {
            neighbours,
            stats,
            duration,
        })
    }

    fn effective_k(&self, len: usize) -> Result<usize> {
        let k = self.config.k;
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        if len == 0 {
            return Err(KnnError::EmptyDataset);
        }
        if k <= len {
            return Ok(k);
        }

        match self.config.k_policy {
            KPolicy::Clamp => {
                warn!("k ({}) exceeds dataset size ({}), clamping", k, len);
                Ok(len)
            }
            KPolicy::Reject => Err(KnnError::KExceedsDataset { k, len }),
        }
    }
}

/// Find the `k` sketches of `dataset` nearest to `query` with default settings.
pub fn nearest_neighbours<'a, L, Q>(
    dataset: &'a [Sketch<L>],
    query: &Sketch<Q>,
    k: usize,
) -> Result<Vec<Neighbour<'a, L>>> {
    let search = KnnSearch::new(SearchConfig::new(k));
    Ok(search.search(dataset, query.points())?.neighbours)
}

/// Order neighbours by ascending distance, then by dataset position.
pub fn sort_by_distance<L>(neighbours: &mut [Neighbour<'_, L>]) {
    neighbours.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::dtw;
    use approx::assert_relative_eq;

    fn line(offset: f64, label: &'static str) -> Sketch<&'static str> {
        let points = (0..4)
            .map(|i| Point::new(i as f64 + offset, i as f64 + offset))
            .collect();
        Sketch::new(points, label).unwrap()
    }

    fn sorted_indices<L>(neighbours: &mut [Neighbour<'_, L>]) -> Vec<usize> {
        sort_by_distance(neighbours);
        neighbours.iter().map(|n| n.index).collect()
    }

    #[test]
    fn test_search_basic() {
        let dataset = vec![line(9.0, "far"), line(0.0, "exact"), line(1.0, "near")];
        let query = line(0.0, "query");

        let search = KnnSearch::new(SearchConfig::new(2));
        let mut result = search.search(&dataset, query.points()).unwrap();

        assert_eq!(result.neighbours.len(), 2);
        assert_eq!(sorted_indices(&mut result.neighbours), vec![1, 2]);
        assert_relative_eq!(result.neighbours[0].distance, 0.0, epsilon = 1e-12);
        assert_eq!(*result.neighbours[0].sketch.label(), "exact");
        assert_eq!(result.stats.scanned, 3);
    }

    #[test]
    fn test_distances_match_unbounded_dtw() {
        let dataset: Vec<_> = (0..8).map(|i| line(i as f64 * 0.7, "l")).collect();
        let query = line(2.1, "q");

        let result = KnnSearch::new(SearchConfig::new(3))
            .search(&dataset, query.points())
            .unwrap();
        for n in &result.neighbours {
            let exact = dtw(dataset[n.index].points(), query.points(), ABANDONED);
            assert_relative_eq!(n.distance, exact, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_early_abandonment_counted() {
        let mut dataset = vec![line(0.0, "a"), line(0.5, "b")];
        dataset.extend((0..5).map(|i| line(50.0 + i as f64, "far")));
        let query = line(0.0, "q");

        let result = KnnSearch::new(SearchConfig::new(2))
            .search(&dataset, query.points())
            .unwrap();
        assert_eq!(result.stats.scanned, 7);
        assert_eq!(result.stats.abandoned, 5);
        assert_eq!(result.stats.replaced, 0);
    }

    #[test]
    fn test_replacements_counted() {
        let dataset: Vec<_> = (0..5).rev().map(|i| line(i as f64, "l")).collect();
        let query = line(0.0, "q");

        let result = KnnSearch::new(SearchConfig::new(1))
            .search(&dataset, query.points())
            .unwrap();
        assert_eq!(result.stats.replaced, 4);
        assert_eq!(result.neighbours[0].index, 4);
    }

    #[test]
    fn test_k_clamped_to_dataset() {
        let dataset = vec![line(0.0, "a"), line(1.0, "b")];
        let query = line(0.0, "q");

        let result = KnnSearch::new(SearchConfig::new(5))
            .search(&dataset, query.points())
            .unwrap();
        assert_eq!(result.neighbours.len(), 2);
        assert!(result.neighbours.iter().all(|n| n.distance.is_finite()));
    }

    #[test]
    fn test_k_rejected_when_strict() {
        let dataset = vec![line(0.0, "a")];
        let query = line(0.0, "q");
        let config = SearchConfig::new(2).with_k_policy(KPolicy::Reject);

        assert!(matches!(
            KnnSearch::new(config).search(&dataset, query.points()),
            Err(KnnError::KExceedsDataset { k: 2, len: 1 })
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        let dataset = vec![line(0.0, "a")];
        let empty: Vec<Sketch<&str>> = Vec::new();
        let query = line(0.0, "q");

        assert!(matches!(
            KnnSearch::new(SearchConfig::new(0)).search(&dataset, query.points()),
            Err(KnnError::InvalidK)
        ));
        assert!(matches!(
            KnnSearch::new(SearchConfig::new(1)).search(&empty, query.points()),
            Err(KnnError::EmptyDataset)
        ));
        assert!(matches!(
            KnnSearch::new(SearchConfig::new(1)).search(&dataset, &[]),
            Err(KnnError::NoPoints)
        ));
    }

    #[test]
    fn test_nearest_neighbours_wrapper() {
        let dataset = vec![line(3.0, "c"), line(1.0, "b"), line(0.0, "a")];
        let query = Sketch::parse_points("0,0 1,1 2,2 3,3", ()).unwrap();

        let mut neighbours = nearest_neighbours(&dataset, &query, 1).unwrap();
        assert_eq!(sorted_indices(&mut neighbours), vec![2]);
    }

    #[test]
    fn test_sort_by_distance_breaks_ties_by_index() {
        let a = line(0.0, "a");
        let mut neighbours = vec![
            Neighbour { index: 3, sketch: &a, distance: 1.0 },
            Neighbour { index: 1, sketch: &a, distance: 1.0 },
            Neighbour { index: 2, sketch: &a, distance: 0.5 },
        ];
        assert_eq!(sorted_indices(&mut neighbours), vec![2, 1, 3]);
    }
}
