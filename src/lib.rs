//! # Sketch kNN
//!
//! Nearest-neighbour matching of hand-drawn sketches.
//!
//! This library provides:
//! - Point and sketch types carrying an opaque label
//! - Dynamic time warping with early abandonment
//! - A bounded top-k selector (fixed-capacity max-heap)
//! - Exhaustive k-NN search and majority-vote classification
//! - JSON / bincode dataset files
//! - PPM snapshots of a query and its neighbours
//!
//! ## Example
//!
//! ```rust
//! use sketch_knn::{KnnSearch, SearchConfig, Sketch};
//!
//! let dataset = vec![
//!     Sketch::parse_points("0,0 1,1 2,2", "diagonal").unwrap(),
//!     Sketch::parse_points("0,0 1,0 2,0", "horizontal").unwrap(),
//! ];
//! let query = Sketch::parse_points("0,0 0,0 1,1 2,2", "?").unwrap();
//!
//! let search = KnnSearch::new(SearchConfig::new(1));
//! let result = search.search(&dataset, query.points()).unwrap();
//! assert_eq!(*result.neighbours[0].sketch.label(), "diagonal");
//! ```

pub mod classify;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod point;
pub mod render;
pub mod search;
pub mod selector;

pub use classify::{evaluate, majority_label, Evaluation};
pub use dataset::{Dataset, DatasetFormat};
pub use distance::{dtw, LocalCost, ABANDONED};
pub use error::{KnnError, Result};
pub use point::{Point, Sketch};
pub use render::{save_ppm, save_results};
pub use search::{
    nearest_neighbours, sort_by_distance, KPolicy, KnnSearch, Neighbour, SearchConfig,
    SearchResult, SearchStats,
};
pub use selector::{BoundedMaxHeap, Candidate};
