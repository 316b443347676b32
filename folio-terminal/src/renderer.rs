/// ASCII rasterizer for the terminal preview
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use folio_core::scene::Frame;
use folio_core::{Camera, Triangle};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;

/// Rectangle of the character grid a model is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32 * CELL_ASPECT
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    character: char,
    color: Color,
}

const BLANK: Cell = Cell {
    character: ' ',
    color: Color::Reset,
};

/// Rasterizes scene frames into a character grid
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
            light_dir: Vector3::new(0.3, 0.6, 1.0).normalize(),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    /// Character at a grid position, for inspection
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    pub fn render_frame(&mut self, frame: &Frame<'_>, camera: &mut Camera, viewport: Viewport, color: Color) {
        camera.set_aspect(viewport.aspect());
        let mvp = camera.view_projection() * frame.model;
        for triangle in &frame.mesh.triangles {
            self.render_triangle(triangle, &frame.model, &mvp, viewport, color);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        mvp: &Matrix4<f32>,
        viewport: Viewport,
        color: Color,
    ) {
        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            let Some(p) = Camera::project(mvp, &vertex.position, viewport.width as f32, viewport.height as f32)
            else {
                return; // Triangle is clipped
            };
            *slot = (p.x + viewport.x as f32, p.y + viewport.y as f32, p.depth);
        }

        let normal = model.transform_vector(&triangle.calculate_normal());
        let Some(normal) = normal.try_normalize(f32::EPSILON) else {
            return;
        };
        // Faces turned from the light still occlude what is behind them
        let brightness = normal.dot(&self.light_dir).max(0.0);
        let index = ((brightness * LUMINOSITY_RAMP.len() as f32) as usize).min(LUMINOSITY_RAMP.len() - 1);
        let cell = Cell {
            character: LUMINOSITY_RAMP[index],
            color,
        };

        self.rasterize_triangle(&screen, viewport, cell);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], viewport: Viewport, cell: Cell) {
        let [v0, v1, v2] = *coords;

        // Bounding box, clipped to the viewport
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(viewport.x as i64);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min((viewport.x + viewport.width).min(self.width) as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(viewport.y as i64);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64)
            .min((viewport.y + viewport.height).min(self.height) as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.cells[idx] = cell;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if y > 0 {
                writer.queue(Print("\r\n"))?;
            }
            for cell in row {
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);
    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    Some((w0, w1, 1.0 - w0 - w1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::animation::Pose;
    use folio_core::{Mesh, Orientation};

    fn frame(mesh: &Mesh) -> Frame<'_> {
        Frame {
            mesh,
            model: Matrix4::new_rotation(Vector3::new(0.4, 0.6, 0.0)),
            pose: Pose {
                orientation: Orientation::zero(),
                lift: 0.0,
            },
        }
    }

    fn filled(renderer: &AsciiRenderer) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for y in 0..renderer.height() {
            for x in 0..renderer.width() {
                if renderer.char_at(x, y) != Some(' ') {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    #[test]
    fn test_cube_fills_the_middle_of_its_viewport() {
        let mesh = Mesh::cube(1.5);
        let mut renderer = AsciiRenderer::new(80, 24);
        let viewport = Viewport {
            x: 40,
            y: 0,
            width: 40,
            height: 24,
        };
        renderer.render_frame(&frame(&mesh), &mut Camera::default(), viewport, Color::White);

        let cells = filled(&renderer);
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|&(x, _)| x >= 40));
        assert_ne!(renderer.char_at(60, 12), Some(' '));
    }

    #[test]
    fn test_camera_aspect_follows_each_viewport() {
        let mesh = Mesh::cube(1.5);
        let mut renderer = AsciiRenderer::new(80, 24);
        let mut camera = Camera::default();
        let half = Viewport {
            x: 0,
            y: 1,
            width: 40,
            height: 23,
        };
        renderer.render_frame(&frame(&mesh), &mut camera, half, Color::White);
        assert!((camera.aspect - 40.0 / (23.0 * 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_clear_blanks_everything() {
        let mesh = Mesh::cube(1.5);
        let mut renderer = AsciiRenderer::new(40, 20);
        let viewport = Viewport {
            x: 0,
            y: 0,
            width: 40,
            height: 20,
        };
        renderer.render_frame(&frame(&mesh), &mut Camera::default(), viewport, Color::White);
        renderer.clear();
        assert!(filled(&renderer).is_empty());
    }

    #[test]
    fn test_barycentric_degenerate_triangle() {
        assert_eq!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)), None);
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
    }
}
