use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

use super::{DotGeometry, Widget};
use crate::error::RenderError;
use crate::ui::theme::ColorTheme;

pub const DEFAULT_CANVAS_SIZE: u32 = 384;
pub const DEFAULT_DOT_SIZE: u32 = 12;
pub const DOT_COUNT: usize = 16;
const COLUMNS: usize = 4;
/// Center-to-center distance, in dot radii.
const SPACING_RADII: u32 = 10;

/// 4x4 grid of filled dots, bit 0 top-left, bit 15 bottom-right, row-major.
#[derive(Debug, Clone)]
pub struct DotGrid {
    canvas_size: u32,
    dots: [DotGeometry; DOT_COUNT],
    paths: Vec<Path>,
    blank: Pixmap,
}

impl DotGrid {
    pub fn new(canvas_size: u32, dot_size: u32) -> Result<Self, RenderError> {
        if farthest_center(dot_size).is_none() {
            return Err(RenderError::DotSize(dot_size));
        }
        let blank = Pixmap::new(canvas_size, canvas_size).ok_or(RenderError::CanvasSize(canvas_size))?;

        let dots: [DotGeometry; DOT_COUNT] = std::array::from_fn(|i| dot_position(i, dot_size));
        let paths = dots
            .iter()
            .map(|d| PathBuilder::from_circle(d.center_x, d.center_y, d.radius))
            .collect::<Option<Vec<_>>>()
            .ok_or(RenderError::DotSize(dot_size))?;

        Ok(Self {
            canvas_size,
            dots,
            paths,
            blank,
        })
    }

    pub fn dots(&self) -> &[DotGeometry; DOT_COUNT] {
        &self.dots
    }
}

/// Center coordinate of the last row/column, or `None` when `dot_size` is
/// zero or the grid does not fit in `u32` pixels.
pub fn farthest_center(dot_size: u32) -> Option<u32> {
    if dot_size == 0 {
        return None;
    }
    let step = dot_size.checked_mul(SPACING_RADII)?;
    step.checked_mul(COLUMNS as u32 - 1)?.checked_add(dot_size)
}

// Callers check `farthest_center` first
fn dot_position(i: usize, dot_size: u32) -> DotGeometry {
    let step = dot_size * SPACING_RADII;
    let column = (i % COLUMNS) as u32;
    let row = (i / COLUMNS % COLUMNS) as u32;
    DotGeometry::new(
        (dot_size + step * column) as f32,
        (dot_size + step * row) as f32,
        dot_size as f32,
    )
}

impl Widget for DotGrid {
    fn render(&self, pixmap: &mut Pixmap, value: u16, theme: &ColorTheme) {
        let mut paint = Paint::default();
        paint.anti_alias = true;

        for (i, path) in self.paths.iter().enumerate() {
            let bit_set = (value >> i) & 1 == 1;
            paint.set_color(theme.color_for(bit_set).to_color());
            pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    fn blank_canvas(&self) -> Pixmap {
        self.blank.clone()
    }
}
