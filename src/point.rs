//! Point and sketch types

use crate::error::{KnnError, Result};
use serde::{Deserialize, Serialize};

/// A point of a sketch in 2-D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse a point from an `x,y` pair of finite coordinates
    pub fn from_str(s: &str) -> Result<Self> {
        let mut coords = s.split(',').map(|c| match c.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(KnnError::InvalidPoint {
                reason: format!("Invalid coordinate '{}' in '{}'", c.trim(), s),
            }),
        });

        match (coords.next(), coords.next(), coords.next()) {
            (Some(x), Some(y), None) => Ok(Point::new(x?, y?)),
            _ => Err(KnnError::InvalidPoint {
                reason: format!("Expected 'x,y', got '{}'", s),
            }),
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// An ordered, non-empty stroke of points carrying an opaque label.
///
/// The label is never inspected by the matching engine; it only travels
/// with the sketch so that callers can classify by neighbour labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch<L> {
    points: Vec<Point>,
    label: L,
}

impl<L> Sketch<L> {
    /// Create a sketch, rejecting an empty point list
    pub fn new(points: Vec<Point>, label: L) -> Result<Self> {
        if points.is_empty() {
            return Err(KnnError::NoPoints);
        }
        Ok(Self { points, label })
    }

    /// Parse a sketch from whitespace- or `;`-separated `x,y` pairs
    pub fn parse_points(s: &str, label: L) -> Result<Self> {
        let points = s
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|tok| !tok.is_empty())
            .map(Point::from_str)
            .collect::<Result<Vec<_>>>()?;
        Sketch::new(points, label)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn label(&self) -> &L {
        &self.label
    }

    /// Number of points in the sketch
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for sketches built through [`Sketch::new`]; deserialized
    /// sketches are validated by the dataset loader.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
