//! Decides whether live frames or idle content reach the panel.
//!
//! The [`Arbiter`] owns the [`Panel`] outright. Live frames arrive over a channel from the
//! receiver task; the idle watcher and the filler cadence are timers in the same
//! `select!` loop. Only one branch runs at a time, so a filler write can never interleave
//! with a live write, and a filler is stopped simply by dropping it before the live frame
//! is written.
//!
//! The event handlers ([`Arbiter::on_live_frame`], [`Arbiter::on_watch_tick`],
//! [`Arbiter::on_filler_tick`]) are public so the state machine can be driven without a
//! runtime.
//!
//! Sink writes are synchronous and run on the arbiter task. A device frame is a few
//! kilobytes written to a character device, so a write blocks the worker for well under a
//! frame interval; a sink slower than that delays the next `select!` turn, not other tasks
//! on a multi-threaded runtime.

use core::{future::Future, time::Duration};
use std::io::Write;

use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    Result,
    frame::Frame,
    idle::{Filler, FillerFactory},
    ingest::ReceivedFrame,
    panel::Panel,
};

/// Which source currently owns the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum DisplayState {
    /// Live frames are arriving.
    #[display("live")]
    Live,
    /// No recent live frame; idle content (or nothing) is shown.
    #[display("idle")]
    Idle,
}

/// Timing knobs for the [`Arbiter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArbiterSettings {
    /// How long without a live frame before idle content starts.
    pub idle_threshold: Duration,
    /// How often the idle watcher checks.
    pub watch_interval: Duration,
    /// Time between filler frames.
    pub frame_interval: Duration,
}

impl Default for ArbiterSettings {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(10),
            watch_interval: Duration::from_secs(1),
            frame_interval: Duration::from_millis(50),
        }
    }
}

/// Live/idle state machine in front of a [`Panel`].
pub struct Arbiter<S: Write> {
    panel: Panel<S>,
    factory: Box<dyn FillerFactory>,
    settings: ArbiterSettings,
    state: DisplayState,
    last_live: Option<Instant>,
    filler: Option<Box<dyn Filler>>,
    idle_blanked: bool,
}

impl<S: Write> Arbiter<S> {
    /// Start in [`DisplayState::Idle`]; the first watcher check starts a filler.
    #[must_use]
    pub fn new(panel: Panel<S>, factory: Box<dyn FillerFactory>, settings: ArbiterSettings) -> Self {
        Self {
            panel,
            factory,
            settings,
            state: DisplayState::Idle,
            last_live: None,
            filler: None,
            idle_blanked: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DisplayState {
        self.state
    }

    /// Name of the running filler, if any.
    #[must_use]
    pub fn filler_name(&self) -> Option<&'static str> {
        self.filler.as_ref().map(|filler| filler.name())
    }

    /// Show a live frame, stopping any filler first.
    ///
    /// # Errors
    ///
    /// Propagates sink errors from [`Panel::write_frame`].
    pub fn on_live_frame(&mut self, frame: &Frame, now: Instant) -> Result<()> {
        self.last_live = Some(now);
        if let Some(filler) = self.filler.take() {
            info!(filler = filler.name(), "live frame received, stopping idle content");
        }
        if self.state != DisplayState::Live {
            info!("display is live");
            self.state = DisplayState::Live;
        }
        self.idle_blanked = false;
        self.panel.write_frame(frame)
    }

    /// [`Self::on_live_frame`] for a frame straight from the listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameSize`](crate::Error::FrameSize) if the pixel count does not match the
    /// panel, and sink errors otherwise.
    pub fn on_received(&mut self, received: &ReceivedFrame, now: Instant) -> Result<()> {
        let geometry = self.panel.geometry();
        let frame = Frame::from_rgb_bytes(geometry.width(), geometry.height(), &received.pixels)?;
        debug!(source = %received.source, checksum = ?received.checksum, "live frame");
        self.on_live_frame(&frame, now)
    }

    /// Idle watcher check. Returns whether a filler was started.
    ///
    /// Once the idle threshold has passed and no filler is running, a fresh filler is
    /// started. With no idle content the panel is blanked once instead.
    ///
    /// # Errors
    ///
    /// Propagates the sink error of that blank write.
    pub fn on_watch_tick(&mut self, now: Instant) -> Result<bool> {
        let idle = self
            .last_live
            .is_none_or(|last_live| now.saturating_duration_since(last_live) > self.settings.idle_threshold);
        if !idle || self.filler.is_some() {
            return Ok(false);
        }
        if self.state != DisplayState::Idle {
            info!(threshold = ?self.settings.idle_threshold, "no live frames, display is idle");
            self.state = DisplayState::Idle;
        }
        if let Some(filler) = self.factory.start_filler() {
            info!(filler = filler.name(), "starting idle content");
            self.filler = Some(filler);
            return Ok(true);
        }
        if !self.idle_blanked {
            self.idle_blanked = true;
            self.panel.blank()?;
        }
        Ok(false)
    }

    /// Write the running filler's next frame, if a filler is running.
    ///
    /// # Errors
    ///
    /// Propagates sink errors from [`Panel::write_frame`].
    pub fn on_filler_tick(&mut self) -> Result<()> {
        let Some(filler) = self.filler.as_mut() else {
            return Ok(());
        };
        let frame = filler.next_frame();
        self.panel.write_frame(&frame)
    }

    /// Drive the panel until `shutdown` completes or the frame channel closes, then blank it.
    ///
    /// # Errors
    ///
    /// Returns the first sink error; output stops at that point.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<ReceivedFrame>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tokio::pin!(shutdown);

        let mut watcher = time::interval(self.settings.watch_interval);
        watcher.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cadence = time::interval(self.settings.frame_interval);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                received = frames.recv() => {
                    let Some(received) = received else {
                        info!("frame channel closed");
                        break;
                    };
                    self.on_received(&received, Instant::now())?;
                }
                _ = watcher.tick() => {
                    if self.on_watch_tick(Instant::now())? {
                        cadence.reset_immediately();
                    }
                }
                _ = cadence.tick(), if self.filler.is_some() => {
                    self.on_filler_tick()?;
                }
            }
        }

        self.filler = None;
        self.panel.shutdown()
    }
}
