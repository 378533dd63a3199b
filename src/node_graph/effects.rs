//! Asynchronous completions and their route back onto the graph's thread.
//!
//! Background work never touches the graph. It posts an [`EffectEvent`] to an
//! unbounded channel; the engine drains that channel on its own thread and
//! re-enters through `calculate`.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::models::node_graph::{NodeId, OutputCoordinate};
use crate::models::node_type::NodeType;
use crate::models::values::{Loop, MediaRef, PortValue};

/// Side effect requested by an impure eval.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectRequest {
    StartTimer {
        timer_id: Uuid,
        loop_index: usize,
        delay_seconds: f64,
        value: PortValue,
    },
    LoadMedia {
        loop_index: usize,
        key: String,
    },
}

/// Node state an effect was issued against. Completions from another generation are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Generation {
    pub node_type: Option<NodeType>,
    pub epoch: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EffectKind {
    TimerFired {
        timer_id: Uuid,
        loop_index: usize,
        value: PortValue,
    },
    MediaLoaded {
        loop_index: usize,
        key: String,
        media: Option<MediaRef>,
    },
    /// Host-provided value for a node's output.
    OutputDelivered { port_index: usize, values: Loop },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectEvent {
    pub node_id: NodeId,
    /// `None` for host deliveries, which are never stale.
    pub generation: Option<Generation>,
    pub kind: EffectKind,
}

/// Cloneable handle for posting completions from any thread.
#[derive(Clone, Debug)]
pub struct EffectSender {
    tx: UnboundedSender<EffectEvent>,
}

impl EffectSender {
    /// Returns false once the engine has been dropped.
    pub fn send(&self, event: EffectEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn deliver_output(&self, output: OutputCoordinate, values: Loop) -> bool {
        self.send(EffectEvent {
            node_id: output.node_id,
            generation: None,
            kind: EffectKind::OutputDelivered {
                port_index: output.port_index,
                values,
            },
        })
    }
}

/// How delay timers wait.
#[derive(Clone, Debug)]
pub enum TimerDriver {
    /// Sleep on a tokio runtime and post when done.
    Runtime(Handle),
    /// Fire during `graph_step` once graph time reaches the deadline.
    GraphClock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRequest {
    pub node_id: NodeId,
    pub loop_index: usize,
    pub key: String,
}

/// Completion handle handed to a [`MediaLoader`]. May be completed from any thread.
#[derive(Debug)]
pub struct MediaReply {
    sender: EffectSender,
    node_id: NodeId,
    loop_index: usize,
    key: String,
    generation: Generation,
}

impl MediaReply {
    pub fn complete(self, media: Option<MediaRef>) -> bool {
        self.sender.send(EffectEvent {
            node_id: self.node_id,
            generation: Some(self.generation),
            kind: EffectKind::MediaLoaded {
                loop_index: self.loop_index,
                key: self.key,
                media,
            },
        })
    }
}

/// Host integration that resolves media keys.
pub trait MediaLoader: Send + Sync {
    fn load(&self, request: MediaRequest, reply: MediaReply);
}

#[derive(Debug)]
struct ClockTimer {
    deadline: f64,
    event: EffectEvent,
}

pub(crate) struct EffectQueue {
    sender: EffectSender,
    receiver: UnboundedReceiver<EffectEvent>,
    driver: TimerDriver,
    clock_timers: Vec<ClockTimer>,
    media_loader: Option<Arc<dyn MediaLoader>>,
}

impl EffectQueue {
    pub(crate) fn new(driver: TimerDriver) -> Self {
        let (tx, receiver) = mpsc::unbounded_channel();
        Self {
            sender: EffectSender { tx },
            receiver,
            driver,
            clock_timers: Vec::new(),
            media_loader: None,
        }
    }

    pub(crate) fn sender(&self) -> EffectSender {
        self.sender.clone()
    }

    pub(crate) fn driver(&self) -> &TimerDriver {
        &self.driver
    }

    pub(crate) fn set_driver(&mut self, driver: TimerDriver) {
        self.driver = driver;
    }

    pub(crate) fn set_media_loader(&mut self, loader: Option<Arc<dyn MediaLoader>>) {
        self.media_loader = loader;
    }

    /// Routes an eval's request to the timer driver or the media loader.
    ///
    /// Returns `false` when nothing could take the request.
    pub(crate) fn dispatch(
        &mut self,
        node_id: NodeId,
        generation: Generation,
        request: EffectRequest,
        graph_time: f64,
    ) -> bool {
        match request {
            EffectRequest::StartTimer {
                timer_id,
                loop_index,
                delay_seconds,
                value,
            } => {
                let delay_seconds = if delay_seconds.is_finite() {
                    delay_seconds.max(0.0)
                } else {
                    0.0
                };
                let event = EffectEvent {
                    node_id,
                    generation: Some(generation),
                    kind: EffectKind::TimerFired {
                        timer_id,
                        loop_index,
                        value,
                    },
                };
                match &self.driver {
                    TimerDriver::Runtime(handle) => {
                        let sender = self.sender.clone();
                        handle.spawn(async move {
                            tokio::time::sleep(timer_duration(delay_seconds)).await;
                            if !sender.send(event) {
                                log::debug!("timer {timer_id} fired after the engine was dropped");
                            }
                        });
                    }
                    TimerDriver::GraphClock => self.clock_timers.push(ClockTimer {
                        deadline: graph_time + delay_seconds,
                        event,
                    }),
                }
                true
            }
            EffectRequest::LoadMedia { loop_index, key } => match &self.media_loader {
                Some(loader) => {
                    let reply = MediaReply {
                        sender: self.sender.clone(),
                        node_id,
                        loop_index,
                        key: key.clone(),
                        generation,
                    };
                    loader.load(
                        MediaRequest {
                            node_id,
                            loop_index,
                            key,
                        },
                        reply,
                    );
                    true
                }
                None => {
                    log::warn!(
                        "media '{key}' requested by {node_id} but no media loader is installed"
                    );
                    false
                }
            },
        }
    }

    /// Posts every graph-clock timer whose deadline has passed, earliest first.
    pub(crate) fn fire_due_timers(&mut self, graph_time: f64) {
        const EPSILON: f64 = 1e-9;
        let mut due: Vec<ClockTimer> = Vec::new();
        let mut i = 0;
        while i < self.clock_timers.len() {
            if self.clock_timers[i].deadline <= graph_time + EPSILON {
                due.push(self.clock_timers.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline));
        for timer in due {
            self.sender.send(timer.event);
        }
    }

    pub(crate) fn clear_clock_timers(&mut self) {
        self.clock_timers.clear();
    }

    pub(crate) fn pending_clock_timers(&self) -> usize {
        self.clock_timers.len()
    }

    pub(crate) fn try_next(&mut self) -> Option<EffectEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Delays too long for a `Duration` saturate instead of panicking.
fn timer_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
