#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # geocluster
//!
//! A high-performance Rust crate for hierarchical geographic (and
//! non-geographic) point clustering.
//!
//! ## Documentation
//!
//! For more in-depth details, please refer to the full [documentation](https://docs.rs/geocluster).
//!
//! This crate was initially inspired by Mapbox's supercluster [blog post](https://blog.mapbox.com/clustering-millions-of-points-on-a-map-with-supercluster-272046ec5c97).
//!
//! ## Usage
//!
//! To use the `geocluster` crate in your project, add it to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! geocluster = "0.1"
//! ```
//!
//! Below is an example of how to build a configuration, load a set of
//! points, and query the resulting index.
//!
//! ```rust
//! use geocluster::{Supercluster, SuperclusterError};
//!
//! fn main() -> Result<(), SuperclusterError> {
//!     // Set the configuration settings
//!     let options = Supercluster::<(f64, f64)>::builder()
//!         .radius(40.0)
//!         .extent(512.0)
//!         .min_points(2)
//!         .max_zoom(16)
//!         .build();
//!
//!     // Create a new instance with the specified configuration settings
//!     let mut cluster = Supercluster::new(options);
//!
//!     // Load points into the index. `load` takes the point set and two
//!     // closures that read a point's longitude/latitude in degrees.
//!     let points = vec![(0.0, 0.0), (0.0001, 0.0001), (40.0, 40.0)];
//!     let index = cluster.load(points, |p| Some(p.0), |p| Some(p.1))?;
//!
//!     // Query clusters and unclustered points visible in a viewport
//!     let results = index.get_clusters_and_points(-180.0, -90.0, 180.0, 90.0, 2.0)?;
//!     println!("{} results at zoom 2", results.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Benchmarks
//!
//! We use the `criterion` crate to benchmark the performance of the
//! `geocluster` crate.
//!
//! Benchmarks help us understand the performance characteristics of
//! geocluster and identify areas for optimization.
//!
//! We have several benchmark scenarios to test different aspects of
//! geocluster:
//!
//! - **Loading a point set**: Tests the performance of loading points into the `Supercluster` index.
//! - **Getting clusters**: Tests the performance of retrieving clusters for a given bounding box and zoom level.
//! - **Getting children**: Tests the performance of expanding a cluster into its direct children.
//!
//! For more detailed benchmark scenarios, please refer to the `benches` directory in the repository.
//!
//! ## Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` to ensure everything is implemented in 100% safe Rust.

/// Supercluster builder module.
/// This module contains the builder pattern for the supercluster configuration settings.
pub mod builder;

/// Supercluster error module.
/// This module contains the error types for the geocluster crate.
pub mod error;

/// KDBush module.
/// This module contains the KD-tree implementation backing each zoom level's index.
pub mod kdbush;

/// Node module.
/// This module contains the tagged leaf/cluster node type stored in every tree.
pub mod node;

/// Supercluster module.
/// This module contains the clustering engine implementation.
pub mod supercluster;

pub use builder::*;
pub use error::*;
pub use kdbush::*;
pub use node::*;
pub use supercluster::*;
