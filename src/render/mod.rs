//! Frame rendering: worker pool, rasterization and post-processing.

mod context;
mod framebuffer;
pub mod postprocess;
pub mod rasterizer;
mod renderer;
mod triangle;
mod worker;

pub use context::FrameContext;
pub use framebuffer::{FrameBuffer, ZBuffer};
pub use rasterizer::{Fill, Rasterizer, ScanlineRasterizer};
pub use renderer::{FrameStats, Renderer};
pub use triangle::ProjectedTriangle;
pub use worker::{CompletionToken, Instruction, JoinCounter, WorkerPool};
