//! Image passes that run over the finished frame and its depth buffer.

mod depth;
mod edges;
mod shading;
mod zbuffer_view;

pub use depth::{log_depth, DepthRange};
pub use edges::{apply_edge_outline, detect_edges, dilate};
pub use shading::apply_pseudo_shading;
pub use zbuffer_view::render_zbuffer;
