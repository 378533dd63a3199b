use crate::settings::FieldRefreshPolicy;

/// Clock shared by every eval during one graph step.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphStepState {
    /// Seconds since the prototype started.
    pub graph_time: f64,
    pub frame_count: u64,
    pub estimated_fps: f64,
    last_tick: Option<(f64, u64)>,
}

impl GraphStepState {
    pub fn new(default_fps: f64) -> Self {
        Self {
            graph_time: 0.0,
            frame_count: 0,
            estimated_fps: default_fps,
            last_tick: None,
        }
    }

    pub(crate) fn advance(&mut self, elapsed_time: f64, frame_count: u64) {
        if let Some((last_time, last_frame)) = self.last_tick {
            let dt = elapsed_time - last_time;
            let frames = frame_count.saturating_sub(last_frame);
            if dt > 0.0 && frames > 0 {
                self.estimated_fps = frames as f64 / dt;
            }
        }
        self.last_tick = Some((elapsed_time, frame_count));
        self.graph_time = elapsed_time;
        self.frame_count = frame_count;
    }

    pub(crate) fn restart(&mut self) {
        self.graph_time = 0.0;
        self.frame_count = 0;
        self.last_tick = None;
    }
}

/// Decides on which frames auxiliary UI fields refresh, based on canvas zoom.
#[derive(Clone, Debug)]
pub struct FieldRefreshThrottle {
    policy: FieldRefreshPolicy,
    zoom: f64,
    last_refresh: Option<u64>,
}

impl FieldRefreshThrottle {
    pub fn new(policy: FieldRefreshPolicy) -> Self {
        Self {
            policy,
            zoom: 1.0,
            last_refresh: None,
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Frames between refreshes at the current zoom.
    pub fn interval(&self) -> u64 {
        if self.zoom >= self.policy.full_rate_zoom {
            1
        } else if self.zoom >= self.policy.reduced_rate_zoom {
            self.policy.reduced_interval.max(1)
        } else {
            self.policy.minimal_interval.max(1)
        }
    }

    pub fn should_refresh(&mut self, frame_count: u64) -> bool {
        let due = match self.last_refresh {
            None => true,
            Some(last) => frame_count.saturating_sub(last) >= self.interval() || frame_count < last,
        };
        if due {
            self.last_refresh = Some(frame_count);
        }
        due
    }
}
