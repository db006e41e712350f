use thiserror::Error;

/// Errors from setting up a scene or renderer.
///
/// Rendering a frame never fails; these only come out of construction and
/// configuration calls.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load texture: {0}")]
    Texture(#[from] image::ImageError),

    #[error("field of view must be between 0 and 180 degrees, got {0}")]
    InvalidFov(f64),

    #[error("resolution factor must be positive and finite, got {0}")]
    InvalidResolutionFactor(f64),

    #[error("render worker pool needs at least one worker")]
    InvalidWorkerCount,

    #[error("failed to spawn thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[cfg(feature = "viewer")]
    #[error("failed to load OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),
}

pub type Result<T> = std::result::Result<T, Error>;
