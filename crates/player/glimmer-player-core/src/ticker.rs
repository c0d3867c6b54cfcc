//! Virtual-frame clock driving the display host's per-frame callback.
//!
//! The ticker owns no thread: the embedder feeds it elapsed wall time via
//! `advance`, and it decides when a virtual frame is due. One ticker is
//! shared by every composition of a display host, so a frame-rate downgrade
//! from one scene lowers the rate for all of them.

/// Accumulating virtual-frame clock.
#[derive(Debug)]
pub struct Ticker {
    fps: u32,
    interval_ms: f32,
    running: bool,
    paused: bool,
    accumulated_ms: f32,
}

impl Ticker {
    pub const DEFAULT_FPS: u32 = 60;

    /// Create a stopped ticker at the given virtual frame rate.
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            fps,
            interval_ms: 1000.0 / fps as f32,
            running: false,
            paused: false,
            accumulated_ms: 0.0,
        }
    }

    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Change the virtual frame rate. Accumulated time is kept so a pending
    /// frame is not lost across a downgrade.
    pub fn set_fps(&mut self, fps: u32) {
        let fps = fps.max(1);
        self.fps = fps;
        self.interval_ms = 1000.0 / fps as f32;
    }

    /// Start (or restart) ticking. Clears the paused state.
    pub fn start(&mut self) {
        self.running = true;
        self.paused = false;
    }

    /// Pause frame generation without discarding clock state.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause. No-op when not paused.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stop the clock entirely; `start` is required to tick again.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulated_ms = 0.0;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Paused is observable whenever frames are not being generated.
    #[inline]
    pub fn is_paused(&self) -> bool {
        !self.running || self.paused
    }

    /// Feed elapsed wall-clock milliseconds. Returns the virtual-frame delta
    /// when a frame is due, consuming the accumulated time.
    pub fn advance(&mut self, elapsed_ms: f32) -> Option<f32> {
        if self.is_paused() {
            return None;
        }
        self.accumulated_ms += elapsed_ms.max(0.0);
        // Small tolerance so a 16.66ms frame fires on a 16.6ms step.
        if self.accumulated_ms + 0.1 >= self.interval_ms {
            let dt = self.accumulated_ms;
            self.accumulated_ms = 0.0;
            Some(dt)
        } else {
            None
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FPS)
    }
}
