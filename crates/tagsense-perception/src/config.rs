//! Configuration for a team sense
//!
//! Defines the sense index, stimulus strength, event buffering and inbox limits.

use crate::PerceptionError;
use serde::{Deserialize, Serialize};
use tagsense_domain::SenseId;

/// Configuration for a [`TeamSense`](crate::TeamSense)
///
/// # Examples
///
/// ```
/// use tagsense_perception::SenseConfig;
///
/// // Default configuration (unbounded buffer)
/// let config = SenseConfig::default();
/// assert_eq!(config.max_pending_events, 0);
///
/// // Keep at most 64 events between updates
/// let config = SenseConfig::bounded(64);
/// assert_eq!(config.max_pending_events, 64);
///
/// // Deliver through `on_stimulus` observers only
/// let config = SenseConfig::observers_only();
/// assert_eq!(config.max_inbox, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenseConfig {
    /// Index of this sense; listeners opt in by including it in their sense set
    /// Default: 0
    #[serde(default)]
    pub sense_index: u8,

    /// Strength carried by every delivered stimulus
    /// Default: 1.0
    #[serde(default = "default_stimulus_strength")]
    pub stimulus_strength: f32,

    /// Maximum events buffered between updates (0 = unbounded)
    /// When full, the oldest event is dropped
    /// Default: 0
    #[serde(default)]
    pub max_pending_events: usize,

    /// Maximum undrained stimuli kept per listener (0 = no inbox, observers only)
    /// When full, the oldest stimulus is dropped
    /// Default: 256
    #[serde(default = "default_max_inbox")]
    pub max_inbox: usize,

    /// Log every delivered stimulus at debug level
    /// Default: false
    #[serde(default)]
    pub log_deliveries: bool,
}

fn default_stimulus_strength() -> f32 {
    1.0
}

fn default_max_inbox() -> usize {
    256
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self {
            sense_index: 0,
            stimulus_strength: default_stimulus_strength(),
            max_pending_events: 0,
            max_inbox: default_max_inbox(),
            log_deliveries: false,
        }
    }
}

impl SenseConfig {
    /// Default configuration with a bounded event buffer
    pub fn bounded(max_pending_events: usize) -> Self {
        Self {
            max_pending_events,
            ..Self::default()
        }
    }

    /// Default configuration that delivers to observers only, keeping no inbox
    pub fn observers_only() -> Self {
        Self {
            max_inbox: 0,
            ..Self::default()
        }
    }

    /// Get the configured sense as a [`SenseId`]
    pub fn sense_id(&self) -> Result<SenseId, PerceptionError> {
        SenseId::new(self.sense_index).ok_or_else(|| {
            PerceptionError::Config(format!(
                "sense_index must be at most {} (got {})",
                SenseId::MAX_INDEX,
                self.sense_index
            ))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PerceptionError> {
        self.sense_id()?;
        if !self.stimulus_strength.is_finite() || self.stimulus_strength < 0.0 {
            return Err(PerceptionError::Config(format!(
                "stimulus_strength must be a non-negative number (got {})",
                self.stimulus_strength
            )));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, PerceptionError> {
        let config: SenseConfig = toml::from_str(toml_str)
            .map_err(|e| PerceptionError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, PerceptionError> {
        toml::to_string_pretty(self)
            .map_err(|e| PerceptionError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
