//! Cluster API resource definitions
//!
//! Only the subset of `cluster.x-k8s.io` types the fleet helper reads from the
//! management cluster. The helper never writes these objects.

pub mod cluster;
pub mod references;

pub use cluster::*;
pub use references::*;
