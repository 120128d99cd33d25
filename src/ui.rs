pub mod render;
pub mod theme;
pub mod widgets;

pub use render::render;
pub use theme::{ColorTheme, Palette, Rgba, ThemeCycle};
pub use widgets::Widget;
pub use widgets::dot_grid::DotGrid;
