//! Configuration for the display host.

use crate::error::PlayerError;
use serde::{Deserialize, Serialize};

/// Configuration for a display host and its virtual-frame clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Target virtual frame rate for the shared ticker.
    pub target_fps: u32,
    /// Frame rate ceiling applied when a loaded scene declares a low render
    /// quality level. Host-wide: one low-end scene lowers the rate for all.
    pub reduced_fps: u32,
    /// Upper clamp on a single tick's delta, in virtual milliseconds.
    pub max_frame_delta_ms: f32,
    /// Maximum events retained per tick before the dispatcher drops new ones.
    pub max_events_per_tick: usize,
    /// Whether disposing a single named composition implicitly resumes the
    /// remaining ones. Matches the historical contract; disable to require
    /// an explicit `resume` after a targeted dispose.
    pub resume_on_targeted_dispose: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            reduced_fps: 30,
            max_frame_delta_ms: 33.0,
            max_events_per_tick: 1024,
            resume_on_targeted_dispose: true,
        }
    }
}

impl PlayerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.target_fps == 0 {
            return Err(PlayerError::InvalidValue {
                reason: "target fps must be greater than 0".to_string(),
            });
        }
        if self.reduced_fps == 0 || self.reduced_fps > self.target_fps {
            return Err(PlayerError::InvalidValue {
                reason: "reduced fps must be in 1..=target_fps".to_string(),
            });
        }
        if self.max_frame_delta_ms <= 0.0 || !self.max_frame_delta_ms.is_finite() {
            return Err(PlayerError::InvalidValue {
                reason: "max frame delta must be positive and finite".to_string(),
            });
        }
        if self.max_events_per_tick == 0 {
            return Err(PlayerError::InvalidValue {
                reason: "max events per tick must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Set the target virtual frame rate.
    #[inline]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set the reduced frame rate used for low render-quality scenes.
    #[inline]
    pub fn with_reduced_fps(mut self, fps: u32) -> Self {
        self.reduced_fps = fps;
        self
    }

    /// Set the per-tick delta clamp in virtual milliseconds.
    #[inline]
    pub fn with_max_frame_delta_ms(mut self, ms: f32) -> Self {
        self.max_frame_delta_ms = ms;
        self
    }

    /// Enable or disable the implicit resume after a targeted dispose.
    #[inline]
    pub fn with_resume_on_targeted_dispose(mut self, enabled: bool) -> Self {
        self.resume_on_targeted_dispose = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PlayerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.target_fps, 60);
        assert_eq!(cfg.reduced_fps, 30);
        assert!(cfg.resume_on_targeted_dispose);
    }

    #[test]
    fn validation_rejects_bad_rates() {
        let cfg = PlayerConfig::default().with_target_fps(0);
        assert!(cfg.validate().is_err());

        let cfg = PlayerConfig::default().with_reduced_fps(120);
        assert!(cfg.validate().is_err());

        let cfg = PlayerConfig::default().with_max_frame_delta_ms(0.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_chains() {
        let cfg = PlayerConfig::default()
            .with_target_fps(120)
            .with_reduced_fps(24)
            .with_resume_on_targeted_dispose(false);
        assert_eq!(cfg.target_fps, 120);
        assert_eq!(cfg.reduced_fps, 24);
        assert!(!cfg.resume_on_targeted_dispose);
    }
}
