use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which timer driver an engine picks at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerDriverKind {
    /// Use the current tokio runtime if there is one, else the graph clock.
    #[default]
    Auto,
    Runtime,
    GraphClock,
}

impl TimerDriverKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "runtime" => Some(Self::Runtime),
            "graph_clock" | "graphClock" => Some(Self::GraphClock),
            _ => None,
        }
    }
}

/// Canvas zoom thresholds for refreshing auxiliary UI fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldRefreshPolicy {
    pub full_rate_zoom: f64,
    pub reduced_rate_zoom: f64,
    pub reduced_interval: u64,
    pub minimal_interval: u64,
}

impl Default for FieldRefreshPolicy {
    fn default() -> Self {
        Self {
            full_rate_zoom: 0.75,
            reduced_rate_zoom: 0.4,
            reduced_interval: 3,
            minimal_interval: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    pub timer_driver: TimerDriverKind,
    /// One start/done line per calculate pass, plus the slowest nodes.
    pub log_summary: bool,
    pub log_node_timings: bool,
    /// Upper bound on effect events applied per drain.
    pub max_effects_per_drain: usize,
    pub field_refresh: FieldRefreshPolicy,
    pub default_fps: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timer_driver: TimerDriverKind::Auto,
            log_summary: false,
            log_node_timings: false,
            max_effects_per_drain: 1024,
            field_refresh: FieldRefreshPolicy::default(),
            default_fps: 60.0,
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads flat key/value settings, as stored by a host preferences table.
    /// Missing or malformed keys keep their defaults.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let policy = defaults.field_refresh.clone();
        Self {
            timer_driver: map
                .get("timer_driver")
                .and_then(|v| TimerDriverKind::parse(v))
                .unwrap_or(defaults.timer_driver),
            log_summary: map
                .get("log_summary")
                .map(|v| v == "true")
                .unwrap_or(defaults.log_summary),
            log_node_timings: map
                .get("log_node_timings")
                .map(|v| v == "true")
                .unwrap_or(defaults.log_node_timings),
            max_effects_per_drain: map
                .get("max_effects_per_drain")
                .and_then(|v| v.parse::<usize>().ok())
                .map(|v| v.max(1))
                .unwrap_or(defaults.max_effects_per_drain),
            field_refresh: FieldRefreshPolicy {
                full_rate_zoom: map
                    .get("full_rate_zoom")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy.full_rate_zoom),
                reduced_rate_zoom: map
                    .get("reduced_rate_zoom")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy.reduced_rate_zoom),
                reduced_interval: map
                    .get("reduced_interval")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy.reduced_interval),
                minimal_interval: map
                    .get("minimal_interval")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(policy.minimal_interval),
            },
            default_fps: map
                .get("default_fps")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|fps| *fps > 0.0)
                .unwrap_or(defaults.default_fps),
        }
    }
}
