use serde::Serialize;

use super::{ArcSegment, CanvasSurface, ColorStop, ImageData, Paint, Rect};
use crate::render::{SurfaceError, SurfaceResult};

/// Paint state that drawing operations pick up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawState {
    pub fill: Paint,
    pub stroke: String,
    pub line_width: f64,
    pub font: String,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: Paint::color("#000000"),
            stroke: "#000000".to_string(),
            line_width: 1.0,
            font: "10px sans-serif".to_string(),
        }
    }
}

/// Path builder step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathOp {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc(ArcSegment),
    Rect(Rect),
    ClosePath,
}

/// A primitive that reached the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    ClearRect {
        rect: Rect,
    },
    FillRect {
        rect: Rect,
        fill: Paint,
    },
    StrokeRect {
        rect: Rect,
        stroke: String,
        line_width: f64,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        fill: Paint,
        font: String,
    },
    FillPath {
        path: Vec<PathOp>,
        fill: Paint,
    },
    StrokePath {
        path: Vec<PathOp>,
        stroke: String,
        line_width: f64,
    },
    PutImageData {
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },
}

/// Serializable view of a [`RecordingCanvas`]
#[derive(Debug, Clone, Serialize)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    pub state: DrawState,
    pub operations: Vec<DrawOp>,
}

/// In-memory canvas that records what was drawn
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    state: DrawState,
    saved: Vec<DrawState>,
    path: Vec<PathOp>,
    operations: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: DrawState::default(),
            saved: Vec::new(),
            path: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn operations(&self) -> &[DrawOp] {
        &self.operations
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            width: self.width,
            height: self.height,
            state: self.state.clone(),
            operations: self.operations.clone(),
        }
    }
}

fn check_stops(stops: &[ColorStop]) -> SurfaceResult<()> {
    match stops.iter().find(|s| !(0.0..=1.0).contains(&s.offset)) {
        Some(stop) => Err(SurfaceError::IndexSize(format!(
            "color stop offset {} is outside [0, 1]",
            stop.offset
        ))),
        None => Ok(()),
    }
}

impl CanvasSurface for RecordingCanvas {
    fn set_fill_style(&mut self, paint: Paint) -> SurfaceResult<()> {
        match &paint {
            Paint::Color { .. } => {}
            Paint::LinearGradient { stops, .. } => check_stops(stops)?,
            Paint::RadialGradient { r0, r1, stops, .. } => {
                if *r0 < 0.0 || *r1 < 0.0 {
                    return Err(SurfaceError::IndexSize(format!(
                        "gradient radius is negative ({}, {})",
                        r0, r1
                    )));
                }
                check_stops(stops)?;
            }
        }
        self.state.fill = paint;
        Ok(())
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.state.stroke = color.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        // non-positive and non-finite widths are ignored, as on a real canvas
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_font(&mut self, font: &str) {
        self.state.font = font.to_string();
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.operations.push(DrawOp::ClearRect { rect });
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.operations.push(DrawOp::FillRect {
            rect,
            fill: self.state.fill.clone(),
        });
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.operations.push(DrawOp::StrokeRect {
            rect,
            stroke: self.state.stroke.clone(),
            line_width: self.state.line_width,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.operations.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            fill: self.state.fill.clone(),
            font: self.state.font.clone(),
        });
    }

    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(PathOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.push(PathOp::LineTo { x, y });
    }

    fn arc(&mut self, arc: ArcSegment) -> SurfaceResult<()> {
        if arc.radius < 0.0 {
            return Err(SurfaceError::IndexSize(format!(
                "arc radius {} is negative",
                arc.radius
            )));
        }
        self.path.push(PathOp::Arc(arc));
        Ok(())
    }

    fn rect(&mut self, rect: Rect) {
        self.path.push(PathOp::Rect(rect));
    }

    fn close_path(&mut self) {
        self.path.push(PathOp::ClosePath);
    }

    fn fill(&mut self) {
        self.operations.push(DrawOp::FillPath {
            path: self.path.clone(),
            fill: self.state.fill.clone(),
        });
    }

    fn stroke(&mut self) {
        self.operations.push(DrawOp::StrokePath {
            path: self.path.clone(),
            stroke: self.state.stroke.clone(),
            line_width: self.state.line_width,
        });
    }

    fn put_image_data(&mut self, image: ImageData, x: f64, y: f64) -> SurfaceResult<()> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.data.len() != expected {
            return Err(SurfaceError::ImageData {
                width: image.width,
                height: image.height,
                expected,
                actual: image.data.len(),
            });
        }

        self.operations.push(DrawOp::PutImageData {
            x,
            y,
            width: image.width,
            height: image.height,
        });
        Ok(())
    }

    fn reset(&mut self) {
        self.state = DrawState::default();
        self.saved.clear();
        self.path.clear();
        self.operations.clear();
    }
}
