//! 2D canvas surface and its command server.
//!
//! [`CanvasSurface`] is the drawing contract the command handlers rely on;
//! [`RecordingCanvas`] is an in-memory implementation that records every
//! primitive together with the paint state in effect.

mod recording;
mod server;

pub use recording::{CanvasSnapshot, DrawOp, DrawState, PathOp, RecordingCanvas};
pub use server::install_canvas_server;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::SurfaceResult;

/// Canvas shared between its command server and whoever renders it
pub type SharedCanvas<S> = Arc<Mutex<S>>;

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Gradient color stop; offsets are expected in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Fill paint: plain color or gradient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paint {
    Color {
        color: String,
    },
    LinearGradient {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: Vec<ColorStop>,
    },
    RadialGradient {
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
        stops: Vec<ColorStop>,
    },
}

impl Paint {
    pub fn color(color: impl Into<String>) -> Self {
        Paint::Color {
            color: color.into(),
        }
    }
}

/// Circular arc path segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub counter_clockwise: bool,
}

/// Raw RGBA pixels, four bytes per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Drawing operations a canvas must support
pub trait CanvasSurface: Send + 'static {
    fn set_fill_style(&mut self, paint: Paint) -> SurfaceResult<()>;
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_font(&mut self, font: &str);

    fn clear_rect(&mut self, rect: Rect);
    fn fill_rect(&mut self, rect: Rect);
    fn stroke_rect(&mut self, rect: Rect);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    fn save(&mut self);
    fn restore(&mut self);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, arc: ArcSegment) -> SurfaceResult<()>;
    fn rect(&mut self, rect: Rect);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn put_image_data(&mut self, image: ImageData, x: f64, y: f64) -> SurfaceResult<()>;

    /// Clear everything and return to the initial drawing state
    fn reset(&mut self);
}
