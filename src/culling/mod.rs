//! Visibility culling: frustum planes and the octree they query.

pub mod frustum;
pub mod octree;

pub use frustum::{Frustum, Plane};
pub use octree::Octree;
