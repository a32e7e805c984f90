//! # KD-tree module
//!
//! A static, two-dimensional spatial index over a frozen set of points. One
//! instance is built per zoom level during [`crate::Supercluster::load`] and
//! then queried many times; nothing is ever inserted or removed after
//! [`KDBush::build_index`] runs.
//!
//! The index only promises two things: the `within_bounds`/`within_radius`
//! contract, and that returned values are the *item index* each point was
//! given by [`KDBush::add_point`] (its position in insertion order), not its
//! internal storage position after sorting. That indirection is what lets
//! callers keep a parallel `Vec` of payload alongside the index without the
//! index knowing anything about the payload's shape.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One stored point: coordinates plus the item index it was added with.
type Entry = (f64, f64, usize);

/// A static KD-tree index over two-dimensional points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct KDBush {
    /// Leaf bucket size: a subtree holding this many points or fewer is
    /// scanned linearly instead of being split further.
    pub node_size: usize,

    /// Points in insertion order until `build_index` runs, then permuted
    /// into KD-tree order. The third tuple element is always the point's
    /// original insertion index, so queries can report it regardless of
    /// where the point now sits.
    entries: Vec<Entry>,
}

impl KDBush {
    /// Create an empty index sized for `num_items` points with the given
    /// leaf bucket size.
    pub fn new(num_items: usize, node_size: usize) -> Self {
        KDBush {
            node_size: node_size.max(1),
            entries: Vec::with_capacity(num_items),
        }
    }

    /// Add a point and return the item index it was assigned (points are
    /// numbered in the order `add_point` is called).
    pub fn add_point(&mut self, x: f64, y: f64) -> usize {
        let index = self.entries.len();
        self.entries.push((x, y, index));
        index
    }

    /// Number of points stored in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort the stored points into KD-tree order. Must be called once,
    /// after every point has been added and before any query is issued.
    pub fn build_index(&mut self) {
        let node_size = self.node_size;
        sort_kd(&mut self.entries, node_size, 0);
    }

    /// Return the item indices of every point inside the closed
    /// axis-aligned rectangle `[min_x, max_x] x [min_y, max_y]`. Order is
    /// unspecified.
    pub fn within_bounds(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let mut result = Vec::new();
        range_search(
            &self.entries,
            self.node_size,
            min_x,
            min_y,
            max_x,
            max_y,
            0,
            &mut result,
        );
        result
    }

    /// Return the item indices of every point within Euclidean distance
    /// `radius` of `(x, y)`. Order is unspecified.
    pub fn within_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        radius_search(
            &self.entries,
            self.node_size,
            x,
            y,
            radius,
            0,
            &mut result,
        );
        result
    }
}

/// Recursively partition `slice` into KD-tree order: split around the
/// median on the axis given by `depth` (alternating x/y), then recurse on
/// each half, until a slice is small enough to be a leaf bucket.
fn sort_kd(slice: &mut [Entry], node_size: usize, depth: usize) {
    if slice.len() <= node_size + 1 {
        return;
    }

    let mid = (slice.len() - 1) / 2;

    if depth % 2 == 0 {
        slice.select_nth_unstable_by(mid, |a, b| a.0.partial_cmp(&b.0).unwrap());
    } else {
        slice.select_nth_unstable_by(mid, |a, b| a.1.partial_cmp(&b.1).unwrap());
    }

    let (left, rest) = slice.split_at_mut(mid);
    let right = &mut rest[1..];

    sort_kd(left, node_size, depth + 1);
    sort_kd(right, node_size, depth + 1);
}

/// Mirror of `sort_kd`'s recursion so bucket boundaries and split axis
/// always agree with how the slice was actually partitioned.
#[allow(clippy::too_many_arguments)]
fn range_search(
    slice: &[Entry],
    node_size: usize,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    depth: usize,
    out: &mut Vec<usize>,
) {
    if slice.len() <= node_size + 1 {
        for &(x, y, id) in slice {
            if x >= min_x && x <= max_x && y >= min_y && y <= max_y {
                out.push(id);
            }
        }
        return;
    }

    let mid = (slice.len() - 1) / 2;
    let (x, y, id) = slice[mid];

    if x >= min_x && x <= max_x && y >= min_y && y <= max_y {
        out.push(id);
    }

    let (split, lo, hi) = if depth % 2 == 0 {
        (x, min_x, max_x)
    } else {
        (y, min_y, max_y)
    };

    if lo <= split {
        range_search(&slice[..mid], node_size, min_x, min_y, max_x, max_y, depth + 1, out);
    }
    if hi >= split {
        range_search(&slice[mid + 1..], node_size, min_x, min_y, max_x, max_y, depth + 1, out);
    }
}

/// Radius-query counterpart of `range_search`, pruning subtrees whose
/// split plane is farther than `radius` from the query point on the
/// current axis.
fn radius_search(
    slice: &[Entry],
    node_size: usize,
    qx: f64,
    qy: f64,
    radius: f64,
    depth: usize,
    out: &mut Vec<usize>,
) {
    let r2 = radius * radius;

    if slice.len() <= node_size + 1 {
        for &(x, y, id) in slice {
            let dx = x - qx;
            let dy = y - qy;
            if dx * dx + dy * dy <= r2 {
                out.push(id);
            }
        }
        return;
    }

    let mid = (slice.len() - 1) / 2;
    let (x, y, id) = slice[mid];

    let dx = x - qx;
    let dy = y - qy;
    if dx * dx + dy * dy <= r2 {
        out.push(id);
    }

    let (split, q) = if depth % 2 == 0 { (x, qx) } else { (y, qy) };

    if q - radius <= split {
        radius_search(&slice[..mid], node_size, qx, qy, radius, depth + 1, out);
    }
    if q + radius >= split {
        radius_search(&slice[mid + 1..], node_size, qx, qy, radius, depth + 1, out);
    }
}
