//! PPM snapshots of sketches and search results

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::point::Point;
use crate::search::Neighbour;

/// Side length in pixels of saved images
pub const IMAGE_SIZE: usize = 256;

const MARGIN: usize = 8;

/// A square black-on-white raster
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    size: usize,
    ink: Vec<bool>,
}

impl Canvas {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ink: vec![false; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the pixel at column `x`, row `y` is inked
    pub fn is_inked(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.ink[y * self.size + x]
    }

    fn plot(&mut self, x: i64, y: i64) {
        let size = self.size as i64;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            self.ink[(y * size + x) as usize] = true;
        }
    }

    // Bresenham
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64)) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);

        loop {
            self.plot(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Binary PPM (P6) encoding
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut bytes = format!("P6\n{} {}\n255\n", self.size, self.size).into_bytes();
        bytes.reserve(self.ink.len() * 3);
        for &inked in &self.ink {
            let level = if inked { 0 } else { 255 };
            bytes.extend_from_slice(&[level, level, level]);
        }
        bytes
    }
}

/// Draw the stroke scaled to fit a `size` x `size` canvas, keeping its aspect ratio.
pub fn render(points: &[Point], size: usize) -> Canvas {
    let mut canvas = Canvas::new(size);
    let Some(first) = points.first() else {
        return canvas;
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let drawable = size.saturating_sub(2 * MARGIN + 1) as f64;
    let span = (max_x - min_x).max(max_y - min_y);
    let scale = if span > 0.0 { drawable / span } else { 0.0 };
    // A single-point stroke lands in the middle
    let offset = if span > 0.0 { MARGIN as f64 } else { (size / 2) as f64 };

    let to_pixel = |p: &Point| {
        (
            (offset + (p.x - min_x) * scale).round() as i64,
            (offset + (p.y - min_y) * scale).round() as i64,
        )
    };

    let mut prev = to_pixel(first);
    canvas.plot(prev.0, prev.1);
    for p in &points[1..] {
        let next = to_pixel(p);
        canvas.line(prev, next);
        prev = next;
    }
    canvas
}

/// Render a stroke and write it to `path` as a PPM image
pub fn save_ppm(points: &[Point], path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, render(points, IMAGE_SIZE).to_ppm())?;
    Ok(())
}

/// File name for the neighbour ranked `rank` (1-based)
pub fn neighbour_file_name(rank: usize, label: &impl Display, distance: f64) -> String {
    let label: String = label
        .to_string()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("image_{:02}_{}_{:.2}.ppm", rank, label, distance)
}

/// Save the query as `query.ppm` and each neighbour, in the given order,
/// under `dir`. Returns the written paths, query first.
pub fn save_results<L: Display>(
    dir: impl AsRef<Path>,
    query: &[Point],
    neighbours: &[Neighbour<'_, L>],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(neighbours.len() + 1);
    let query_path = dir.join("query.ppm");
    save_ppm(query, &query_path)?;
    written.push(query_path);

    for (i, n) in neighbours.iter().enumerate() {
        let path = dir.join(neighbour_file_name(i + 1, n.sketch.label(), n.distance));
        save_ppm(n.sketch.points(), &path)?;
        written.push(path);
    }

    debug!("Saved {} images to {}", written.len(), dir.display());
    Ok(written)
}
