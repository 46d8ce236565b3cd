// Rendering command servers
//
// Each server installs one handler per verb on a command endpoint and
// drives a rendering surface: a 2D canvas or a 3D scene graph.

pub mod canvas;
pub mod scene;

use thiserror::Error;

/// Failures raised by a rendering primitive
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Index or size out of range: {0}")]
    IndexSize(String),

    #[error("Image data has {actual} bytes, {width}x{height} needs {expected}")]
    ImageData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{op} expects {expected} arguments, got {got}")]
    Arguments {
        op: String,
        expected: usize,
        got: usize,
    },
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
