use tiny_skia::Pixmap;

use crate::ui::theme::ColorTheme;

pub mod dot_grid;

/// Center and radius of one drawn dot, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotGeometry {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
}

impl DotGeometry {
    pub fn new(center_x: f32, center_y: f32, radius: f32) -> Self {
        Self { center_x, center_y, radius }
    }

    /// Whole-pixel center, handy for sampling the rendered frame.
    pub fn center_pixel(&self) -> (u32, u32) {
        (self.center_x as u32, self.center_y as u32)
    }
}

/// Base trait for anything that paints the clock value.
pub trait Widget {
    /// Draw `value` into `pixmap` using `theme`. Must not depend on any
    /// state other than its arguments and the widget's own geometry.
    fn render(&self, pixmap: &mut Pixmap, value: u16, theme: &ColorTheme);

    /// Side of the square canvas the widget is laid out for.
    fn canvas_size(&self) -> u32;

    /// A blank canvas of the preferred size, ready for `render`.
    fn blank_canvas(&self) -> Pixmap;

    /// Allocates a canvas and renders into it.
    fn draw(&self, value: u16, theme: &ColorTheme) -> Pixmap {
        let mut pixmap = self.blank_canvas();
        self.render(&mut pixmap, value, theme);
        pixmap
    }
}
