//! Scheduling engine configuration.

use application::EngineConfig;
use serde::{Deserialize, Serialize};

use super::default_true;

/// Floor for the tick interval; narrower windows cannot be serviced
const MIN_TICK_INTERVAL_MS: i64 = 3000;

/// Scheduling engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAppConfig {
    /// Tick interval in milliseconds (default: 3000, floor: 3000)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: i64,

    /// Stale threshold for unacknowledged one-time reminders in
    /// milliseconds (default: 1 hour)
    #[serde(default = "default_stale_threshold_ms")]
    pub stale_threshold_ms: i64,

    /// Self-driven polling loop when true, event mode when false
    #[serde(default = "default_true")]
    pub use_polling: bool,

    /// Cron schedule of the cleanup sweep (6-field, default: daily at
    /// midnight UTC)
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
}

const fn default_tick_interval_ms() -> i64 {
    MIN_TICK_INTERVAL_MS
}

const fn default_stale_threshold_ms() -> i64 {
    3_600_000
}

fn default_cleanup_cron() -> String {
    "0 0 0 * * *".to_string()
}

impl EngineAppConfig {
    /// Tick interval with the floor applied
    #[must_use]
    pub fn effective_tick_interval_ms(&self) -> i64 {
        self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS)
    }

    /// Convert to the engine's timing config
    #[must_use]
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::from_millis(self.effective_tick_interval_ms(), self.stale_threshold_ms)
    }
}

impl Default for EngineAppConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stale_threshold_ms: default_stale_threshold_ms(),
            use_polling: true,
            cleanup_cron: default_cleanup_cron(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineAppConfig::default();
        assert_eq!(config.tick_interval_ms, 3000);
        assert_eq!(config.stale_threshold_ms, 3_600_000);
        assert!(config.use_polling);
        assert_eq!(config.cleanup_cron, "0 0 0 * * *");
    }

    #[test]
    fn tick_interval_floor_is_applied() {
        let config = EngineAppConfig {
            tick_interval_ms: 500,
            ..Default::default()
        };
        assert_eq!(config.effective_tick_interval_ms(), 3000);
    }

    #[test]
    fn larger_tick_interval_is_kept() {
        let config = EngineAppConfig {
            tick_interval_ms: 10_000,
            ..Default::default()
        };
        assert_eq!(config.effective_tick_interval_ms(), 10_000);
    }

    #[test]
    fn engine_config_conversion() {
        let config = EngineAppConfig::default().to_engine_config();
        assert_eq!(config.tick_interval, chrono::Duration::milliseconds(3000));
        assert_eq!(config.stale_threshold, chrono::Duration::hours(1));
    }
}
