use serde::Deserialize;
use tiny_skia::Color;

use crate::error::ConfigError;

/// Straight (non-premultiplied) RGBA, in that byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color(self) -> Color {
        Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// A named pair of dot colors.
///
/// Themes can be given inline in the config file:
///
/// ```yaml
/// themes:
///   - name: Amber
///     on_color: [255, 176, 0, 255]
///     off_color: [255, 176, 0, 48]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColorTheme {
    pub name: String,
    pub on_color: Rgba,
    pub off_color: Rgba,
}

impl ColorTheme {
    pub fn new(name: &str, on_color: Rgba, off_color: Rgba) -> Self {
        Self {
            name: name.to_string(),
            on_color,
            off_color,
        }
    }

    pub fn color_for(&self, bit_set: bool) -> Rgba {
        if bit_set { self.on_color } else { self.off_color }
    }

    pub fn light() -> Self {
        Self::new("Light", Rgba::new(242, 242, 242, 255), Rgba::new(64, 64, 64, 128))
    }

    pub fn light_transparent() -> Self {
        Self::new("LightTransparent", Rgba::new(242, 242, 242, 255), Rgba::new(0, 0, 0, 0))
    }

    pub fn gray() -> Self {
        Self::new("Gray", Rgba::new(64, 64, 64, 255), Rgba::new(64, 64, 64, 64))
    }

    pub fn blue() -> Self {
        Self::new("Blue", Rgba::new(63, 156, 255, 255), Rgba::new(63, 156, 255, 64))
    }

    pub fn red() -> Self {
        Self::new("Red", Rgba::new(232, 46, 46, 225), Rgba::new(242, 46, 46, 64))
    }

    pub fn dark() -> Self {
        Self::new("Dark", Rgba::new(32, 32, 32, 255), Rgba::new(32, 32, 32, 96))
    }
}

/// Built-in theme sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Full,
    LightDark,
}

impl Palette {
    pub fn themes(self) -> Vec<ColorTheme> {
        match self {
            Palette::Full => vec![
                ColorTheme::light(),
                ColorTheme::light_transparent(),
                ColorTheme::gray(),
                ColorTheme::blue(),
                ColorTheme::red(),
            ],
            Palette::LightDark => vec![ColorTheme::light(), ColorTheme::dark()],
        }
    }
}

/// Active theme selection. Starts at the first theme and wraps around.
#[derive(Debug, Clone)]
pub struct ThemeCycle {
    themes: Vec<ColorTheme>,
    index: usize,
}

impl ThemeCycle {
    pub fn new(themes: Vec<ColorTheme>) -> Result<Self, ConfigError> {
        if themes.is_empty() {
            return Err(ConfigError::Invalid("theme list is empty".to_string()));
        }
        Ok(Self { themes, index: 0 })
    }

    pub fn from_palette(palette: Palette) -> Self {
        Self {
            themes: palette.themes(),
            index: 0,
        }
    }

    pub fn current(&self) -> &ColorTheme {
        &self.themes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn advance(&mut self) -> &ColorTheme {
        self.index = (self.index + 1) % self.themes.len();
        self.current()
    }

    /// Case-insensitive. Leaves the selection alone when nothing matches.
    pub fn select(&mut self, name: &str) -> Option<&ColorTheme> {
        let index = self
            .themes
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))?;
        self.index = index;
        Some(self.current())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|t| t.name.as_str())
    }
}

impl Default for ThemeCycle {
    fn default() -> Self {
        Self::from_palette(Palette::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_first_theme() {
        let cycle = ThemeCycle::default();
        assert_eq!(cycle.index(), 0);
        assert_eq!(cycle.current().name, "Light");
    }

    #[test]
    fn n_touches_select_n_mod_count() {
        for palette in [Palette::Full, Palette::LightDark] {
            let mut cycle = ThemeCycle::from_palette(palette);
            let count = cycle.len();
            for n in 1..=(3 * count + 1) {
                cycle.advance();
                assert_eq!(cycle.index(), n % count);
            }
        }
    }

    #[test]
    fn red_wraps_back_to_light() {
        let mut cycle = ThemeCycle::default();
        assert_eq!(cycle.select("red").map(|t| t.name.clone()), Some("Red".to_string()));
        assert_eq!(cycle.advance().name, "Light");
    }

    #[test]
    fn unknown_name_keeps_selection() {
        let mut cycle = ThemeCycle::default();
        cycle.advance();
        assert!(cycle.select("Chartreuse").is_none());
        assert_eq!(cycle.current().name, "LightTransparent");
    }

    #[test]
    fn empty_theme_list_is_rejected() {
        assert!(ThemeCycle::new(Vec::new()).is_err());
    }

    #[test]
    fn off_colors_are_translucent() {
        for theme in Palette::Full.themes() {
            assert!(theme.off_color.a < 255, "{}", theme.name);
            assert_eq!(theme.color_for(true), theme.on_color);
            assert_eq!(theme.color_for(false), theme.off_color);
        }
    }

    #[test]
    fn theme_from_yaml() {
        let yaml = "name: Amber\non_color: [255, 176, 0, 255]\noff_color: [255, 176, 0, 48]\n";
        let theme: ColorTheme = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(theme.on_color, Rgba::new(255, 176, 0, 255));
        assert_eq!(theme.off_color.a, 48);
    }
}
