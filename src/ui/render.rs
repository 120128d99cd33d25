use tiny_skia::Pixmap;

use crate::error::RenderError;
use crate::ui::theme::ColorTheme;
use crate::ui::widgets::Widget;
use crate::ui::widgets::dot_grid::DotGrid;

/// Renders `value` as a dot grid on a fresh transparent canvas.
///
/// Same arguments, same pixels. Sessions keep a [`DotGrid`] around instead
/// of calling this per frame.
pub fn render(value: u16, theme: &ColorTheme, canvas_size: u32, dot_size: u32) -> Result<Pixmap, RenderError> {
    let grid = DotGrid::new(canvas_size, dot_size)?;
    Ok(grid.draw(value, theme))
}

/// `value` as the grid reads it: 16 binary digits, most significant first.
pub fn bit_string(value: u16) -> String {
    format!("{:016b}", value)
}
