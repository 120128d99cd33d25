use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::clock::{ClockCounter, TimeEncoder, WallClock};
use crate::config::Config;
use crate::error::{Error, SinkError};
use crate::ui_log;
use crate::sink::{DisplaySink, WidgetId};
use crate::ui::render::bit_string;
use crate::ui::theme::{ColorTheme, ThemeCycle};
use crate::ui::widgets::Widget;
use crate::ui::widgets::dot_grid::DotGrid;
use log::Level;

/// Consistent view of the session between two events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub value: u16,
    pub theme: String,
    pub theme_index: usize,
    pub ticks_since_resync: u32,
}

/// Everything a running widget owns: the clock value, the active theme, the
/// surfaces to paint and the collaborators that supply time and show frames.
///
/// Created when the widget is enabled and dropped when it is disabled.
/// Every handler runs to completion on `&mut self`, so a tick and a touch
/// can never interleave.
pub struct WidgetSession {
    counter: ClockCounter,
    themes: ThemeCycle,
    grid: DotGrid,
    widget_ids: Vec<WidgetId>,
    clock: Box<dyn WallClock>,
    sink: Box<dyn DisplaySink>,
}

pub type SharedWidgetSession = Arc<Mutex<WidgetSession>>;

impl WidgetSession {
    pub fn new(config: &Config, clock: Box<dyn WallClock>, sink: Box<dyn DisplaySink>) -> Result<Self, Error> {
        config.validate()?;
        let encoder = TimeEncoder::new(config.tick_period);
        Ok(Self {
            counter: ClockCounter::new(encoder, config.resync_interval),
            themes: config.theme_cycle()?,
            grid: DotGrid::new(config.canvas_size, config.dot_size)?,
            widget_ids: config.widget_ids.clone(),
            clock,
            sink,
        })
    }

    pub fn into_shared(self) -> SharedWidgetSession {
        Arc::new(Mutex::new(self))
    }

    pub fn tick_length(&self) -> Duration {
        self.counter.encoder().tick_length()
    }

    pub fn value(&self) -> u16 {
        self.counter.value()
    }

    pub fn theme(&self) -> &ColorTheme {
        self.themes.current()
    }

    pub fn widget_ids(&self) -> &[WidgetId] {
        &self.widget_ids
    }

    pub fn status(&self) -> Status {
        Status {
            value: self.counter.value(),
            theme: self.themes.current().name.clone(),
            theme_index: self.themes.index(),
            ticks_since_resync: self.counter.ticks_since_resync(),
        }
    }

    /// Timer tick: advance the clock and repaint every surface.
    pub fn on_tick(&mut self) -> u16 {
        let value = self.counter.advance(self.clock.as_ref());
        self.repaint();
        value
    }

    /// Tap on the widget: next theme, repainted with the current value.
    pub fn on_touch(&mut self) -> &ColorTheme {
        self.ensure_synced();
        let name = self.themes.advance().name.clone();
        ui_log!(Level::Debug, "Theme -> {}", name);
        self.repaint();
        self.themes.current()
    }

    /// Jump straight to a named theme. `None` if no theme has that name.
    pub fn select_theme(&mut self, name: &str) -> Option<&ColorTheme> {
        self.themes.select(name)?;
        self.ensure_synced();
        self.repaint();
        Some(self.themes.current())
    }

    /// Force a read of the wall clock outside the normal schedule.
    pub fn resync(&mut self) -> u16 {
        let value = self.counter.resync(self.clock.as_ref());
        self.repaint();
        value
    }

    /// Registers a surface and paints it right away.
    pub fn add_widget(&mut self, widget_id: WidgetId) {
        if !self.widget_ids.contains(&widget_id) {
            self.widget_ids.push(widget_id);
        }
        self.ensure_synced();
        let frame = self.grid.draw(self.counter.value(), self.themes.current());
        self.present(widget_id, &frame);
    }

    pub fn remove_widget(&mut self, widget_id: WidgetId) -> bool {
        let before = self.widget_ids.len();
        self.widget_ids.retain(|&id| id != widget_id);
        before != self.widget_ids.len()
    }

    fn ensure_synced(&mut self) {
        if !self.counter.is_synced() {
            self.counter.resync(self.clock.as_ref());
        }
    }

    /// Renders once and hands the frame to every surface. Returns how many
    /// surfaces accepted it.
    fn repaint(&mut self) -> usize {
        let value = self.counter.value();
        let frame = self.grid.draw(value, self.themes.current());
        ui_log!(
            Level::Debug,
            "Painting {} with {} on {} surface(s)",
            bit_string(value),
            self.themes.current().name,
            self.widget_ids.len()
        );

        let ids = self.widget_ids.clone();
        ids.into_iter().filter(|&id| self.present(id, &frame)).count()
    }

    fn present(&mut self, widget_id: WidgetId, frame: &tiny_skia::Pixmap) -> bool {
        match self.sink.present(widget_id, frame) {
            Ok(()) => true,
            Err(SinkError::NoSurface(id)) => {
                // The next tick tries again
                ui_log!(Level::Debug, "No surface for widget {}, skipping frame", id);
                false
            }
            Err(e) => {
                ui_log!(Level::Warn, "Failed to present widget {}: {}", widget_id, e);
                false
            }
        }
    }
}
