//! # Supercluster module
//!
//! The `supercluster` module provides the spatial clustering core for
//! geographic points. This is where the [`Supercluster`] struct lives: a
//! hierarchical index that precomputes, for every zoom level in a
//! configured range, a partitioning of a static point set into clusters and
//! unclustered points.
//!
//! Input points are opaque (`T`): the only thing the index ever asks of
//! them is their longitude and latitude, through caller-supplied
//! projections passed to [`Supercluster::load`]. This keeps the core
//! decoupled from any particular point representation, property schema, or
//! id-generation policy.

use std::{collections::HashMap, f64::consts::PI, hash::BuildHasherDefault};

use twox_hash::XxHash64;

use crate::{
    kdbush::KDBush,
    node::{ClusterNode, NodeKind},
    SuperclusterBuilder, SuperclusterError, SuperclusterOptions,
};

/// One KD-tree and the node payload parallel to it. Built once per zoom
/// level by [`Supercluster::load`] and never mutated by a query.
#[derive(Clone, Debug)]
pub struct Tree {
    /// Spatial index over `nodes`' projected coordinates.
    pub index: KDBush,
    /// Node payload, in the same order/indices the index was built from.
    pub nodes: Vec<ClusterNode>,
}

/// A hierarchical geographic point-clustering index.
///
/// Build with [`Supercluster::builder`] to configure, [`Supercluster::new`]
/// to construct, and [`Supercluster::load`] to index a point set. After
/// `load` returns, the index is read-only: `get_clusters_and_points`,
/// `get_children`, `get_leaves`, and `get_cluster_expansion_zoom` are pure
/// queries safe to call concurrently from multiple threads.
#[derive(Debug)]
pub struct Supercluster<T> {
    /// Configuration settings.
    pub options: SuperclusterOptions,

    /// One tree per zoom level, keyed by zoom. Slot `max_zoom + 1` holds
    /// the leaf-only tree; slots `min_zoom..=max_zoom` hold the clustered
    /// trees. Slots below `min_zoom` are never inserted.
    pub trees: HashMap<usize, Tree, BuildHasherDefault<XxHash64>>,

    /// Input points as passed to `load`, indexable by a leaf's
    /// `point_index()`.
    pub points: Vec<T>,

    /// Number of input points with valid projected coordinates. This, not
    /// `points.len()`, is the `N` used by the cluster id encoding: points
    /// dropped for missing coordinates do not occupy id space.
    point_count: usize,
}

impl<T> Supercluster<T> {
    /// Create a new supercluster builder instance.
    pub fn builder() -> SuperclusterBuilder {
        SuperclusterBuilder::new()
    }

    /// Create a new instance of `Supercluster` with the specified
    /// configuration settings. Call [`Supercluster::load`] before issuing
    /// any query.
    pub fn new(options: SuperclusterOptions) -> Self {
        #[cfg(feature = "log")]
        log::debug!("creating a new supercluster instance");

        Supercluster {
            options,
            trees: HashMap::default(),
            points: Vec::new(),
            point_count: 0,
        }
    }

    /// Project, cluster, and index `points` at every configured zoom
    /// level. This is the only mutator; once it returns, every other
    /// method on `Supercluster` is a pure read.
    ///
    /// `get_x`/`get_y` read a point's longitude/latitude in degrees. A
    /// point for which either returns `None` is silently dropped from the
    /// index (it still occupies a slot in `self.points`, so a surviving
    /// leaf's `point_index()` always indexes correctly into it, but it
    /// never appears in any tree and never reserves cluster-id space).
    ///
    /// # Errors
    ///
    /// Returns [`SuperclusterError::InvalidConfiguration`] if
    /// `max_zoom + 1` does not fit in the cluster id's 5-bit zoom field,
    /// or if the number of valid points does not fit alongside it in a
    /// single cluster id.
    pub fn load<FX, FY>(
        &mut self,
        points: Vec<T>,
        get_x: FX,
        get_y: FY,
    ) -> Result<&mut Self, SuperclusterError>
    where
        FX: Fn(&T) -> Option<f64>,
        FY: Fn(&T) -> Option<f64>,
    {
        #[cfg(feature = "log")]
        log::debug!("loading {} input points into supercluster", points.len());

        let min_zoom = self.options.min_zoom as usize;
        let max_zoom = self.options.max_zoom as usize;

        let mut leaves = Vec::with_capacity(points.len());
        for (i, point) in points.iter().enumerate() {
            let (lon, lat) = match (get_x(point), get_y(point)) {
                (Some(lon), Some(lat)) => (lon, lat),
                _ => continue,
            };
            leaves.push(ClusterNode::leaf(lng_to_x(lon), lat_to_y(lat), i));
        }

        validate_id_space(leaves.len(), max_zoom)?;

        self.points = points;
        self.point_count = leaves.len();
        self.trees.clear();

        let leaf_tree = self.create_tree(leaves);
        self.trees.insert(max_zoom + 1, leaf_tree);

        // Cluster points at max_zoom, then cluster the results at the
        // previous zoom, and so on down to min_zoom; this produces a
        // cluster hierarchy across zoom levels.
        for zoom in (min_zoom..=max_zoom).rev() {
            let next_zoom = zoom + 1;

            let (updated_source, next_nodes) = {
                let tree = self
                    .trees
                    .get(&next_zoom)
                    .ok_or(SuperclusterError::TreeNotFound)?;
                self.merge(&tree.index, &tree.nodes, zoom)
            };

            self.trees
                .get_mut(&next_zoom)
                .ok_or(SuperclusterError::TreeNotFound)?
                .nodes = updated_source;

            #[cfg(feature = "log")]
            log::trace!("built {} clusters/points at zoom {}", next_nodes.len(), zoom);

            let tree = self.create_tree(next_nodes);
            self.trees.insert(zoom, tree);
        }

        Ok(self)
    }

    /// Retrieve clusters and unclustered points inside the given
    /// longitude/latitude viewport at `zoom`.
    ///
    /// Longitudes are normalised to `[-180, 180)` (`east == 180.0` is kept
    /// as `180.0` rather than wrapped to `-180.0`, so a caller can still
    /// express the eastern edge of the full globe). Latitudes are clamped
    /// to `[-90, 90]`. A viewport spanning 360 degrees or more is treated
    /// as the full globe; a viewport whose normalised west is east of its
    /// normalised east crosses the antimeridian and is answered as the
    /// concatenation of the eastern and western halves.
    pub fn get_clusters_and_points(
        &self,
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        zoom: f64,
    ) -> Result<Vec<&ClusterNode>, SuperclusterError> {
        #[cfg(feature = "log")]
        log::debug!(
            "retrieving clusters for zoom {} and bbox [{}, {}, {}, {}]",
            zoom,
            west,
            south,
            east,
            north
        );

        let mut min_lng = normalize_lng(west);
        let min_lat = south.clamp(-90.0, 90.0);
        let mut max_lng = if east == 180.0 {
            180.0
        } else {
            normalize_lng(east)
        };
        let max_lat = north.clamp(-90.0, 90.0);

        if east - west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut eastern_hemisphere =
                self.get_clusters_and_points(min_lng, min_lat, 180.0, max_lat, zoom)?;
            let western_hemisphere =
                self.get_clusters_and_points(-180.0, min_lat, max_lng, max_lat, zoom)?;

            eastern_hemisphere.extend(western_hemisphere);
            return Ok(eastern_hemisphere);
        }

        let tree = self
            .trees
            .get(&self.limit_zoom(zoom))
            .ok_or(SuperclusterError::TreeNotFound)?;

        let ids = tree.index.within_bounds(
            lng_to_x(min_lng),
            lat_to_y(max_lat),
            lng_to_x(max_lng),
            lat_to_y(min_lat),
        );

        Ok(ids.into_iter().map(|i| &tree.nodes[i]).collect())
    }

    /// Retrieve the direct children of a cluster: the nodes from the next
    /// finer zoom level that were folded into it.
    ///
    /// # Errors
    ///
    /// Returns [`SuperclusterError::TreeNotFound`] if the id decodes to a
    /// zoom level with no tree, and [`SuperclusterError::ClusterNotFound`]
    /// if it decodes to an out-of-range array slot or the cluster has no
    /// surviving children at its origin zoom.
    pub fn get_children(&self, cluster_id: usize) -> Result<Vec<&ClusterNode>, SuperclusterError> {
        let origin_zoom = self.origin_zoom(cluster_id);
        let origin_index = self.origin_index(cluster_id);

        let tree = self
            .trees
            .get(&origin_zoom)
            .ok_or(SuperclusterError::TreeNotFound)?;

        let origin = tree.nodes.get(origin_index).ok_or_else(|| {
            #[cfg(feature = "log")]
            log::error!("cluster not found for id {}", cluster_id);

            SuperclusterError::ClusterNotFound
        })?;

        let r = self.options.radius / (self.options.extent * 2f64.powf(origin_zoom as f64 - 1.0));

        let children: Vec<&ClusterNode> = tree
            .index
            .within_radius(origin.x, origin.y, r)
            .into_iter()
            .filter_map(|i| tree.nodes.get(i))
            .filter(|node| node.parent_id() == Some(cluster_id))
            .collect();

        if children.is_empty() {
            #[cfg(feature = "log")]
            log::error!("cluster not found for id {}", cluster_id);

            return Err(SuperclusterError::ClusterNotFound);
        }

        Ok(children)
    }

    /// Retrieve up to `limit` transitive leaf descendants of a cluster,
    /// in preorder, skipping the first `offset`.
    ///
    /// Returns an empty vector (rather than an error) if `cluster_id`
    /// does not resolve, matching the silent-stop behaviour of the
    /// recursive descent: a cluster with no resolvable children simply
    /// contributes no leaves.
    pub fn get_leaves(&self, cluster_id: usize, limit: usize, offset: usize) -> Vec<&ClusterNode> {
        let mut leaves = Vec::new();

        if limit == 0 {
            return leaves;
        }

        self.append_leaves(&mut leaves, cluster_id, limit, offset, 0);

        leaves
    }

    /// Determine the zoom level at which a cluster first breaks apart
    /// into more than one child, descending through chains of
    /// single-child clusters.
    pub fn get_cluster_expansion_zoom(&self, mut cluster_id: usize) -> usize {
        let mut zoom = self.origin_zoom(cluster_id).saturating_sub(1);

        while zoom <= self.options.max_zoom as usize {
            let children = match self.get_children(cluster_id) {
                Ok(children) => children,
                Err(_) => break,
            };

            zoom += 1;

            if children.len() != 1 {
                break;
            }

            match children[0].cluster_id() {
                Some(id) => cluster_id = id,
                None => break,
            }
        }

        zoom
    }

    /// Recursive preorder leaf collection shared by `get_leaves`.
    /// Returns the updated `skipped` count so the caller (or an
    /// enclosing recursive call) can keep tallying past this subtree.
    fn append_leaves<'a>(
        &'a self,
        result: &mut Vec<&'a ClusterNode>,
        cluster_id: usize,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> usize {
        let children = match self.get_children(cluster_id) {
            Ok(children) => children,
            Err(_) => return skipped,
        };

        for child in children {
            if child.is_cluster() {
                let count = child.num_points();

                if skipped + count <= offset {
                    skipped += count;
                } else if let Some(child_id) = child.cluster_id() {
                    skipped = self.append_leaves(result, child_id, limit, offset, skipped);
                }
            } else if skipped < offset {
                skipped += 1;
            } else {
                result.push(child);
            }

            if result.len() == limit {
                break;
            }
        }

        skipped
    }

    /// Build a KD-tree over `nodes`, indexed in `nodes`' order.
    fn create_tree(&self, nodes: Vec<ClusterNode>) -> Tree {
        let mut index = KDBush::new(nodes.len(), self.options.node_size);

        for node in &nodes {
            index.add_point(node.x, node.y);
        }

        index.build_index();

        Tree { index, nodes }
    }

    /// The merge step: greedily fold `source` (the tree at `zoom + 1`)
    /// into clusters for `zoom`, using `tree_index` for neighbor lookups.
    ///
    /// Returns `(updated_source, next)`: `updated_source` is `source`
    /// with `zoom`/`parent_id` updated in place (destined to replace the
    /// node payload of the tree at `zoom + 1`), and `next` is the node
    /// array for the new tree at `zoom`.
    fn merge(
        &self,
        tree_index: &KDBush,
        source: &[ClusterNode],
        zoom: usize,
    ) -> (Vec<ClusterNode>, Vec<ClusterNode>) {
        let r = self.options.radius / (self.options.extent * 2f64.powi(zoom as i32));

        let mut updated = source.to_vec();
        let mut next = Vec::new();

        for i in 0..updated.len() {
            if absorbed_by(zoom as u8, updated[i].zoom) {
                continue;
            }

            updated[i].zoom = Some(zoom as u8);

            let (x, y) = (updated[i].x, updated[i].y);
            let n0 = updated[i].num_points();

            let neighbor_ids: Vec<usize> = tree_index
                .within_radius(x, y, r)
                .into_iter()
                .filter(|&j| j != i)
                .collect();

            let mut n = n0;
            for &j in &neighbor_ids {
                if !absorbed_by(zoom as u8, updated[j].zoom) {
                    n += updated[j].num_points();
                }
            }

            if n > n0 && n >= self.options.min_points {
                // Branch A: enough unabsorbed neighbors to form a cluster.
                let id = (i << 5) + (zoom + 1) + self.point_count;
                let mut wx = x * n0 as f64;
                let mut wy = y * n0 as f64;

                for &j in &neighbor_ids {
                    if absorbed_by(zoom as u8, updated[j].zoom) {
                        continue;
                    }

                    updated[j].zoom = Some(zoom as u8);
                    updated[j].parent_id = Some(id);

                    let nb = updated[j].num_points();
                    wx += updated[j].x * nb as f64;
                    wy += updated[j].y * nb as f64;
                }

                updated[i].parent_id = Some(id);
                next.push(ClusterNode::cluster(wx / n as f64, wy / n as f64, id, n));
            } else {
                // Branch B: carry the pivot forward unchanged, along with
                // any neighbors that were counted but not merged (this
                // happens when the pivot is itself already a cluster
                // large enough that the threshold was never the issue).
                next.push(updated[i]);

                if n > 1 {
                    for &j in &neighbor_ids {
                        if absorbed_by(zoom as u8, updated[j].zoom) {
                            continue;
                        }

                        updated[j].zoom = Some(zoom as u8);
                        next.push(updated[j]);
                    }
                }
            }
        }

        (updated, next)
    }

    /// Clamp a query zoom into the range of trees actually built:
    /// `[min_zoom, max_zoom + 1]`.
    pub fn limit_zoom(&self, zoom: f64) -> usize {
        let floored = zoom.floor();
        let clamped = floored
            .max(self.options.min_zoom as f64)
            .min(self.options.max_zoom as f64 + 1.0);

        clamped as usize
    }

    /// Decode the tree-array slot a cluster id's pivot occupies in its
    /// origin zoom's tree.
    pub fn origin_index(&self, cluster_id: usize) -> usize {
        (cluster_id - self.point_count) >> 5
    }

    /// Decode the zoom level a cluster id was created at.
    pub fn origin_zoom(&self, cluster_id: usize) -> usize {
        (cluster_id - self.point_count) % 32
    }

    /// Borrow the original input point a leaf node refers to.
    pub fn point(&self, index: usize) -> Option<&T> {
        self.points.get(index)
    }
}

/// Whether a node's build-time `zoom` already marks it as absorbed at or
/// before `zoom` (i.e. it is *not* eligible to be counted/merged again).
/// `None` is the "never absorbed" sentinel and is never considered
/// absorbed.
fn absorbed_by(zoom: u8, node_zoom: Option<u8>) -> bool {
    node_zoom.is_some_and(|z| z <= zoom)
}

/// Validate that `n` points at `max_zoom` fit the cluster id encoding:
/// `max_zoom + 1` must fit the id's 5-bit zoom field, and
/// `((n - 1) << 5) + 32 + n` must fit in a `usize`.
fn validate_id_space(n: usize, max_zoom: usize) -> Result<(), SuperclusterError> {
    if max_zoom + 1 >= 32 {
        return Err(SuperclusterError::InvalidConfiguration(format!(
            "max_zoom + 1 ({}) must be less than 32",
            max_zoom + 1
        )));
    }

    let max_origin_index = n.saturating_sub(1);
    let fits = max_origin_index
        .checked_shl(5)
        .and_then(|shifted| shifted.checked_add(32))
        .and_then(|v| v.checked_add(n))
        .is_some();

    if !fits {
        return Err(SuperclusterError::InvalidConfiguration(format!(
            "{n} points do not fit the cluster id encoding"
        )));
    }

    Ok(())
}

/// Normalise a longitude in degrees to `[-180, 180)`.
fn normalize_lng(lng: f64) -> f64 {
    (((lng + 180.0) % 360.0) + 360.0) % 360.0 - 180.0
}

/// Project longitude (degrees) to the `[0, 1]` unit-square x coordinate.
pub fn lng_to_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project latitude (degrees) to the `[0, 1]` unit-square y coordinate
/// (Web Mercator). Poles are clamped into range rather than allowed to
/// diverge.
pub fn lat_to_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - (0.25 * ((1.0 + sin) / (1.0 - sin)).ln()) / PI;

    y.clamp(0.0, 1.0)
}

/// Inverse of [`lng_to_x`].
pub fn x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Inverse of [`lat_to_y`].
pub fn y_to_lat(y: f64) -> f64 {
    let y2 = ((180.0 - y * 360.0) * PI) / 180.0;
    (360.0 * y2.exp().atan()) / PI - 90.0
}
