//! Majority-vote classification from nearest neighbours

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::error::Result;
use crate::point::Sketch;
use crate::search::{KnnSearch, Neighbour};

/// Most frequent label among `neighbours`.
///
/// Labels with the same number of votes are separated by their closest
/// member, then by the dataset position of that member.
pub fn majority_label<'a, L: Eq + Hash>(neighbours: &[Neighbour<'a, L>]) -> Option<&'a L> {
    // label -> (votes, closest distance, position of closest)
    let mut votes: HashMap<&'a L, (usize, f64, usize)> = HashMap::new();

    for n in neighbours {
        let entry = votes
            .entry(n.sketch.label())
            .or_insert((0, f64::INFINITY, usize::MAX));
        entry.0 += 1;
        if (n.distance, n.index) < (entry.1, entry.2) {
            entry.1 = n.distance;
            entry.2 = n.index;
        }
    }

    votes
        .into_iter()
        .min_by(|(_, a), (_, b)| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.total_cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        })
        .map(|(label, _)| label)
}

/// Classification accuracy over a labelled test set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub total: usize,
    pub correct: usize,
}

impl Evaluation {
    /// Fraction of correctly classified sketches (0 for an empty test set)
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// Classify every sketch of `test` against `train` and count the hits.
pub fn evaluate<L: Eq + Hash>(
    search: &KnnSearch,
    train: &[Sketch<L>],
    test: &[Sketch<L>],
) -> Result<Evaluation> {
    let mut evaluation = Evaluation::default();

    for (i, sketch) in test.iter().enumerate() {
        let result = search.search(train, sketch.points())?;
        let predicted = majority_label(&result.neighbours);

        evaluation.total += 1;
        if predicted == Some(sketch.label()) {
            evaluation.correct += 1;
        } else {
            debug!("Test sketch {} misclassified", i);
        }
    }

    debug!(
        "Evaluated {} sketches: {} correct",
        evaluation.total, evaluation.correct
    );
    Ok(evaluation)
}
