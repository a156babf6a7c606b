//! Point costs and early-abandoning dynamic time warping

use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Returned by [`LocalCost::dtw`] when the alignment cost is known to reach
/// the bound. No attainable distance compares equal to it.
pub const ABANDONED: f64 = f64::INFINITY;

/// Cost of aligning one point with another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalCost {
    /// Mean of the absolute per-coordinate differences
    #[default]
    MeanAbsolute,
    /// Euclidean (L2) distance
    Euclidean,
}

impl LocalCost {
    /// Compute the cost of aligning `a` with `b` using this metric
    pub fn cost(&self, a: &Point, b: &Point) -> f64 {
        match self {
            LocalCost::MeanAbsolute => mean_absolute_distance(a, b),
            LocalCost::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Minimal cumulative alignment cost between two point sequences.
    ///
    /// The table is filled one row per point of the longer sequence, keeping
    /// only the previous row. After each row the smallest cell plus the cost
    /// of aligning both final points is a lower bound on the result; once it
    /// reaches `bound` the computation stops and [`ABANDONED`] is returned.
    /// Otherwise the exact cost is returned, which may itself be `>= bound`.
    ///
    /// An empty sequence aligns only with another empty sequence (cost 0).
    pub fn dtw(&self, a: &[Point], b: &[Point], bound: f64) -> f64 {
        debug_assert!(bound >= 0.0, "bound must be non-negative");

        if a.is_empty() || b.is_empty() {
            return if a.is_empty() && b.is_empty() { 0.0 } else { ABANDONED };
        }

        let (rows, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        let tail = self.cost(&rows[rows.len() - 1], &cols[cols.len() - 1]);

        let mut prev = vec![ABANDONED; cols.len() + 1];
        let mut curr = vec![ABANDONED; cols.len() + 1];
        prev[0] = 0.0;

        for (i, p) in rows.iter().enumerate() {
            curr[0] = ABANDONED;
            let mut row_min = ABANDONED;

            for (j, q) in cols.iter().enumerate() {
                let best = prev[j].min(prev[j + 1]).min(curr[j]);
                curr[j + 1] = self.cost(p, q) + best;
                row_min = row_min.min(curr[j + 1]);
            }

            // Every remaining path still has to align the two final points.
            let lower_bound = if i + 1 < rows.len() {
                row_min + tail
            } else {
                row_min
            };
            if lower_bound >= bound {
                return ABANDONED;
            }

            std::mem::swap(&mut prev, &mut curr);
        }

        prev[cols.len()]
    }
}

/// Mean absolute coordinate difference between two points
pub fn mean_absolute_distance(a: &Point, b: &Point) -> f64 {
    ((a.x - b.x).abs() + (a.y - b.y).abs()) / 2.0
}

/// Euclidean (L2) distance between two points
pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Early-abandoning DTW with the default mean-absolute point cost
pub fn dtw(a: &[Point], b: &[Point], bound: f64) -> f64 {
    LocalCost::default().dtw(a, b, bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&c| Point::from(c)).collect()
    }

    #[test]
    fn test_mean_absolute_distance() {
        let d = mean_absolute_distance(&Point::new(1.0, 2.0), &Point::new(4.0, 0.0));
        assert_relative_eq!(d, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_euclidean_distance() {
        let d = euclidean_distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0));
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_sequences() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(dtw(&a, &a.clone(), ABANDONED), 0.0);
    }

    #[test]
    fn test_single_points() {
        let a = pts(&[(1.0, 1.0)]);
        let b = pts(&[(4.0, 5.0)]);
        assert_relative_eq!(dtw(&a, &b, ABANDONED), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_shifted_sequence() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let b = pts(&[(10.0, 10.0), (11.0, 11.0), (12.0, 12.0)]);
        let d = dtw(&a, &b, ABANDONED);

        let endpoints = mean_absolute_distance(&a[2], &b[2]);
        assert!(d > 0.0);
        assert!(d >= endpoints);
        assert_relative_eq!(d, 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_warping_absorbs_repeated_points() {
        let a = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let b = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(dtw(&a, &b, ABANDONED), 0.0);
        assert_eq!(dtw(&b, &a, ABANDONED), 0.0);
    }

    #[test]
    fn test_different_lengths_hand_computed() {
        // Costs: (0,0)-(0,0)=0, (2,0)-(0,0)=1, (2,0)-(2,2)=1, (4,0)-(2,2)=2
        let a = pts(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)]);
        let b = pts(&[(0.0, 0.0), (2.0, 2.0)]);
        assert_relative_eq!(dtw(&a, &b, ABANDONED), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_bound_abandons() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = pts(&[(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(dtw(&a, &b, 0.0), ABANDONED);
    }

    #[test]
    fn test_bound_below_distance_abandons() {
        let a = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let b = pts(&[(10.0, 10.0), (11.0, 11.0), (12.0, 12.0)]);
        assert_eq!(dtw(&a, &b, 20.0), ABANDONED);
        assert_eq!(dtw(&a, &b, 28.5), ABANDONED);
        assert_relative_eq!(dtw(&a, &b, 31.0), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_sequences() {
        let a = pts(&[(0.0, 0.0)]);
        assert_eq!(dtw(&[], &[], ABANDONED), 0.0);
        assert_eq!(dtw(&a, &[], ABANDONED), ABANDONED);
        assert_eq!(dtw(&[], &a, ABANDONED), ABANDONED);
    }

    #[test]
    fn test_euclidean_local_cost() {
        let a = pts(&[(0.0, 0.0)]);
        let b = pts(&[(3.0, 4.0)]);
        assert_relative_eq!(
            LocalCost::Euclidean.dtw(&a, &b, ABANDONED),
            5.0,
            epsilon = 1e-12
        );
    }
}
