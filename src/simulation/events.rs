//! Simulation event stream types.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::packet::Packet;

/// One step of a simulation, as consumed by the canvas and the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    SimulationStarted,
    SimulationEnded {
        success: bool,
    },
    Log {
        message: String,
    },
    PacketCreated {
        packet: Packet,
        at_device_id: String,
    },
    /// A packet moving across one link. `progress` is the share of the
    /// whole path covered once this hop lands, in `(0.0, 1.0]`.
    PacketInTransit {
        packet: Packet,
        from_device_id: String,
        to_device_id: String,
        progress: f32,
    },
    PacketDelivered {
        packet: Packet,
        at_device_id: String,
    },
    PacketDropped {
        packet: Packet,
        reason: String,
    },
    Error {
        message: String,
    },
}

impl SimulationEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log { message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Returns true for the terminal event of a stream
    pub fn is_end(&self) -> bool {
        matches!(self, Self::SimulationEnded { .. })
    }
}

impl std::fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SimulationStarted => write!(f, "[start]"),
            Self::SimulationEnded { success } => {
                write!(f, "[end] {}", if *success { "success" } else { "failure" })
            }
            Self::Log { message } => write!(f, "{}", message),
            Self::PacketCreated { packet, at_device_id } => {
                write!(f, "[{}] {} created at {}", packet.id, packet.kind, at_device_id)
            }
            Self::PacketInTransit { packet, from_device_id, to_device_id, progress } => write!(
                f,
                "[{}] {} {} -> {} ({:.0}%)",
                packet.id,
                packet.kind,
                from_device_id,
                to_device_id,
                progress * 100.0
            ),
            Self::PacketDelivered { packet, at_device_id } => {
                write!(f, "[{}] {} delivered to {}", packet.id, packet.kind, at_device_id)
            }
            Self::PacketDropped { packet, reason } => {
                write!(f, "[{}] {} dropped: {}", packet.id, packet.kind, reason)
            }
            Self::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Queue of events, each with the pause that follows it.
///
/// A pause is served only when the consumer asks for the next event, so a
/// consumer that stops pulling never waits.
#[derive(Debug, Default)]
pub(crate) struct PacedQueue {
    queue: VecDeque<(SimulationEvent, Duration)>,
    owed: Duration,
}

impl PacedQueue {
    pub(crate) fn push(&mut self, event: SimulationEvent) {
        self.queue.push_back((event, Duration::ZERO));
    }

    /// Push an event followed by a pause
    pub(crate) fn push_paced(&mut self, event: SimulationEvent, pause: Duration) {
        self.queue.push_back((event, pause));
    }

    /// Add a pause after the most recently queued event
    pub(crate) fn pause(&mut self, pause: Duration) {
        if let Some((_, after)) = self.queue.back_mut() {
            *after += pause;
        } else {
            self.owed += pause;
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Serve any pause owed by the previous event, then pop the next one
    pub(crate) fn pop(&mut self) -> Option<SimulationEvent> {
        let (event, after) = self.queue.pop_front()?;
        let owed = std::mem::replace(&mut self.owed, after);
        if !owed.is_zero() {
            std::thread::sleep(owed);
        }
        Some(event)
    }

    /// Drop everything still queued
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.owed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paced_queue_order() {
        let mut queue = PacedQueue::default();
        queue.push(SimulationEvent::SimulationStarted);
        queue.push_paced(SimulationEvent::log("a"), Duration::ZERO);
        queue.pause(Duration::ZERO);
        queue.push(SimulationEvent::SimulationEnded { success: true });
        assert_eq!(queue.pop(), Some(SimulationEvent::SimulationStarted));
        assert_eq!(queue.pop(), Some(SimulationEvent::log("a")));
        assert!(queue.pop().map(|e| e.is_end()).unwrap_or(false));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_string(&SimulationEvent::SimulationEnded { success: false }).unwrap();
        assert_eq!(json, r#"{"event":"simulation_ended","success":false}"#);
    }
}
