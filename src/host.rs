use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::logging::HOST_NAMESPACE;
use crate::session::SharedWidgetSession;
use log::{info, trace};

/// Drives a session from a repeating timer, the way the home screen drives
/// the widget: ticks start on enable and stop on disable.
pub struct ClockHost {
    session: SharedWidgetSession,
    ticker: Option<JoinHandle<()>>,
}

impl ClockHost {
    /// Starts ticking immediately, then every tick length of the session.
    pub async fn enable(session: SharedWidgetSession) -> Self {
        let tick_length = session.lock().await.tick_length();
        info!(
            target: HOST_NAMESPACE,
            "Widget enabled, ticking every {:.3} ms",
            tick_length.as_secs_f64() * 1000.0
        );
        let ticker = tokio::spawn(run_ticks(session.clone(), tick_length));
        Self {
            session,
            ticker: Some(ticker),
        }
    }

    pub fn session(&self) -> SharedWidgetSession {
        self.session.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.ticker.is_some()
    }

    pub async fn touch(&self) {
        self.session.lock().await.on_touch();
    }

    /// Cancels the timer. The session itself is left to the caller.
    pub fn disable(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            info!(target: HOST_NAMESPACE, "Widget disabled, timer cancelled");
        }
    }
}

impl Drop for ClockHost {
    fn drop(&mut self) {
        self.disable();
    }
}

async fn run_ticks(session: SharedWidgetSession, tick_length: Duration) {
    let mut ticks = interval(tick_length);
    // A late tick is not made up for; the next resync corrects the value
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticks.tick().await;
        let value = session.lock().await.on_tick();
        trace!(target: HOST_NAMESPACE, "Tick handled, value {}", value);
    }
}
