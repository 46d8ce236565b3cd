use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{ArcSegment, CanvasSurface, ColorStop, ImageData, Paint, Rect, SharedCanvas};
use crate::protocol::{CommandEndpoint, CommandOutcome, CommandResult};
use crate::render::{SurfaceError, SurfaceResult};

#[derive(Debug, Deserialize)]
struct ColorParams {
    color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokeStyleParams {
    color: String,
    line_width: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FontParams {
    font: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RectParams {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Option<String>,
    line_width: Option<f64>,
}

impl RectParams {
    fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextParams {
    text: String,
    x: f64,
    y: f64,
    color: Option<String>,
    font: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PathSegment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    args: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathParams {
    fill_style: Option<String>,
    stroke_style: Option<String>,
    line_width: Option<f64>,
    path: Vec<PathSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinearGradientParams {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color_stops: Vec<ColorStop>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadialGradientParams {
    x0: f64,
    y0: f64,
    r0: f64,
    x1: f64,
    y1: f64,
    r1: f64,
    color_stops: Vec<ColorStop>,
}

#[derive(Debug, Deserialize)]
struct ImageDataParams {
    data: Vec<f64>,
    width: u32,
    height: u32,
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NoParams {}

/// Register a verb whose handler runs synchronously against the locked canvas
fn on<S, P, F>(endpoint: &CommandEndpoint, canvas: &SharedCanvas<S>, verb: &str, apply: F)
where
    S: CanvasSurface,
    P: DeserializeOwned + Send + 'static,
    F: Fn(&mut S, P) -> SurfaceResult<()> + Send + Sync + 'static,
{
    let canvas = Arc::clone(canvas);
    let apply = Arc::new(apply);

    endpoint.handle_typed(verb, move |params: P| {
        let canvas = Arc::clone(&canvas);
        let apply = Arc::clone(&apply);
        async move {
            let mut surface = canvas.lock().await;
            apply(&mut *surface, params)?;
            CommandResult::Ok(CommandOutcome::ok())
        }
    });
}

fn expect_args(op: &str, args: &[f64], expected: usize) -> SurfaceResult<()> {
    if args.len() < expected {
        return Err(SurfaceError::Arguments {
            op: op.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn apply_segment<S: CanvasSurface>(canvas: &mut S, segment: &PathSegment) -> SurfaceResult<()> {
    let args = &segment.args;
    match segment.kind.as_str() {
        "begin_path" => canvas.begin_path(),
        "move_to" => {
            expect_args("move_to", args, 2)?;
            canvas.move_to(args[0], args[1]);
        }
        "line_to" => {
            expect_args("line_to", args, 2)?;
            canvas.line_to(args[0], args[1]);
        }
        "arc" => {
            expect_args("arc", args, 5)?;
            canvas.arc(ArcSegment {
                x: args[0],
                y: args[1],
                radius: args[2],
                start_angle: args[3],
                end_angle: args[4],
                counter_clockwise: args.get(5).is_some_and(|flag| *flag != 0.0),
            })?;
        }
        "rect" => {
            expect_args("rect", args, 4)?;
            canvas.rect(Rect {
                x: args[0],
                y: args[1],
                width: args[2],
                height: args[3],
            });
        }
        "close_path" => canvas.close_path(),
        other => debug!(segment = other, "Ignoring unknown path segment"),
    }
    Ok(())
}

fn draw_path<S: CanvasSurface>(canvas: &mut S, params: &PathParams) -> SurfaceResult<()> {
    if let Some(fill) = &params.fill_style {
        canvas.set_fill_style(Paint::color(fill.as_str()))?;
    }
    if let Some(stroke) = &params.stroke_style {
        canvas.set_stroke_style(stroke);
    }
    if let Some(width) = params.line_width {
        canvas.set_line_width(width);
    }

    canvas.begin_path();
    for segment in &params.path {
        apply_segment(canvas, segment)?;
    }

    if params.fill_style.is_some() {
        canvas.fill();
    }
    if params.stroke_style.is_some() {
        canvas.stroke();
    }
    Ok(())
}

/// Install the 2D canvas verb set on `endpoint`
///
/// Every handler answers `{ success: true }`. Values are handed to the
/// surface unchecked; whatever the surface rejects fails the request.
pub fn install_canvas_server<S: CanvasSurface>(endpoint: &CommandEndpoint, canvas: SharedCanvas<S>) {
    // state
    on(endpoint, &canvas, "set_fill_style", |c: &mut S, p: ColorParams| {
        c.set_fill_style(Paint::color(p.color))
    });

    on(endpoint, &canvas, "set_stroke_style", |c: &mut S, p: StrokeStyleParams| {
        c.set_stroke_style(&p.color);
        if let Some(width) = p.line_width {
            c.set_line_width(width);
        }
        Ok(())
    });

    on(endpoint, &canvas, "set_font", |c: &mut S, p: FontParams| {
        c.set_font(&p.font);
        Ok(())
    });

    // primitives
    on(endpoint, &canvas, "clear_rect", |c: &mut S, p: RectParams| {
        c.clear_rect(p.rect());
        Ok(())
    });

    on(endpoint, &canvas, "fill_rect", |c: &mut S, p: RectParams| {
        if let Some(color) = &p.color {
            c.set_fill_style(Paint::color(color.as_str()))?;
        }
        c.fill_rect(p.rect());
        Ok(())
    });

    on(endpoint, &canvas, "stroke_rect", |c: &mut S, p: RectParams| {
        if let Some(color) = &p.color {
            c.set_stroke_style(color);
        }
        if let Some(width) = p.line_width {
            c.set_line_width(width);
        }
        c.stroke_rect(p.rect());
        Ok(())
    });

    on(endpoint, &canvas, "fill_text", |c: &mut S, p: TextParams| {
        if let Some(color) = p.color {
            c.set_fill_style(Paint::color(color))?;
        }
        if let Some(font) = &p.font {
            c.set_font(font);
        }
        c.fill_text(&p.text, p.x, p.y);
        Ok(())
    });

    // paths draw inside save/restore so their styles do not leak
    on(endpoint, &canvas, "draw_path", |c: &mut S, p: PathParams| {
        c.save();
        let result = draw_path(c, &p);
        c.restore();
        result
    });

    // gradients and pixels
    on(endpoint, &canvas, "set_linear_gradient_fill", |c: &mut S, p: LinearGradientParams| {
        c.set_fill_style(Paint::LinearGradient {
            x0: p.x0,
            y0: p.y0,
            x1: p.x1,
            y1: p.y1,
            stops: p.color_stops,
        })
    });

    on(endpoint, &canvas, "set_radial_gradient_fill", |c: &mut S, p: RadialGradientParams| {
        c.set_fill_style(Paint::RadialGradient {
            x0: p.x0,
            y0: p.y0,
            r0: p.r0,
            x1: p.x1,
            y1: p.y1,
            r1: p.r1,
            stops: p.color_stops,
        })
    });

    on(endpoint, &canvas, "put_image_data", |c: &mut S, p: ImageDataParams| {
        let data = p
            .data
            .iter()
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        c.put_image_data(
            ImageData {
                width: p.width,
                height: p.height,
                data,
            },
            p.x.unwrap_or(0.0),
            p.y.unwrap_or(0.0),
        )
    });

    on(endpoint, &canvas, "reset_canvas", |c: &mut S, _: NoParams| {
        c.reset();
        Ok(())
    });
}
