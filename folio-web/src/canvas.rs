//! Flat-shaded triangle painter on a 2D canvas.
//!
//! Triangles are projected with the core camera, sorted back to front and
//! filled one by one. No depth buffer is needed at these mesh sizes.

use folio_core::scene::Frame;
use folio_core::Camera;
use nalgebra::Vector3;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Base colour of a painted surface, 0-255 per channel
#[derive(Debug, Clone, Copy)]
pub struct Tint(pub u8, pub u8, pub u8);

impl Tint {
    fn shaded(self, light: f32) -> String {
        let scale = |c: u8| (c as f32 * light).round().clamp(0.0, 255.0) as u8;
        format!("rgb({},{},{})", scale(self.0), scale(self.1), scale(self.2))
    }
}

const AMBIENT: f32 = 0.25;

struct Projected {
    points: [(f64, f64); 3],
    depth: f32,
    light: f32,
}

pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    camera: Camera,
    light_dir: Vector3<f32>,
    tint: Tint,
    scratch: Vec<Projected>,
}

impl CanvasPainter {
    pub fn new(canvas: HtmlCanvasElement, tint: Tint) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            context,
            camera: Camera::default(),
            light_dir: Vector3::new(0.4, 0.7, 1.0).normalize(),
            tint,
            scratch: Vec::new(),
        })
    }

    /// Match the backing store to the displayed size.
    fn fit(&mut self) -> (f32, f32) {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        self.camera.set_aspect(width as f32 / height as f32);
        (width as f32, height as f32)
    }

    pub fn clear(&mut self) {
        let (width, height) = self.fit();
        self.context.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    pub fn paint(&mut self, frame: &Frame<'_>) {
        let (width, height) = self.fit();
        self.context.clear_rect(0.0, 0.0, width as f64, height as f64);

        let mvp = self.camera.view_projection() * frame.model;
        self.scratch.clear();
        for triangle in &frame.mesh.triangles {
            let mut points = [(0.0, 0.0); 3];
            let mut depth = 0.0;
            let mut visible = true;
            for (slot, vertex) in points.iter_mut().zip(&triangle.vertices) {
                match Camera::project(&mvp, &vertex.position, width, height) {
                    Some(p) => {
                        *slot = (p.x as f64, p.y as f64);
                        depth += p.depth;
                    }
                    None => {
                        visible = false;
                        break;
                    }
                }
            }
            if !visible {
                continue;
            }

            // Back faces: counter-clockwise in world space is clockwise on a
            // y-down screen
            let [(ax, ay), (bx, by), (cx, cy)] = points;
            if (bx - ax) * (cy - ay) - (by - ay) * (cx - ax) >= 0.0 {
                continue;
            }

            let normal = frame.model.transform_vector(&triangle.vertices[0].normal);
            let diffuse = normal.try_normalize(f32::EPSILON).map_or(0.0, |n| n.dot(&self.light_dir));
            self.scratch.push(Projected {
                points,
                depth: depth / 3.0,
                light: AMBIENT + (1.0 - AMBIENT) * diffuse.max(0.0),
            });
        }

        self.scratch.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        for tri in &self.scratch {
            let [(ax, ay), (bx, by), (cx, cy)] = tri.points;
            let colour = self.tint.shaded(tri.light);
            self.context.set_fill_style_str(&colour);
            self.context.set_stroke_style_str(&colour);
            self.context.begin_path();
            self.context.move_to(ax, ay);
            self.context.line_to(bx, by);
            self.context.line_to(cx, cy);
            self.context.close_path();
            self.context.fill();
            // Hairline stroke hides seams between neighbours
            self.context.stroke();
        }
    }
}
