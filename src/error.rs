//! # Error module
//!
//! Contains the error type for the geocluster crate.

use thiserror::Error;

/// Geocluster error.
/// Represents the different errors that can occur while building or
/// querying a [`crate::Supercluster`] index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuperclusterError {
    /// No cluster was found for the given id: either it decoded to an
    /// out-of-range tree slot, or the cluster has no surviving children
    /// at its origin zoom.
    #[error("cluster not found for the given id")]
    ClusterNotFound,

    /// The decoded origin zoom does not correspond to a tree that was
    /// built by `load`.
    #[error("tree not found at the given zoom level")]
    TreeNotFound,

    /// The supplied configuration cannot be used to build an index:
    /// either `max_zoom + 1` does not fit the cluster id's 5-bit zoom
    /// field, or the number of input points does not fit alongside it in
    /// a single `usize`.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
