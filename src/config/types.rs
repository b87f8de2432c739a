use serde::{Deserialize, Serialize};

use crate::buffer::OverflowPolicy;

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

/// Buffer sizing and overflow behavior of each engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ring capacity of the inbound intent channel (default: 64).
    #[serde(default = "default_intent_capacity")]
    pub intent_capacity: usize,
    /// What happens to intents submitted while the ring is full (default: spill).
    #[serde(default = "default_intent_overflow")]
    pub intent_overflow: OverflowPolicy,
    /// Capacity of the typed and the common event buffers (default: 32).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// What happens to events emitted while a buffer is full (default: drop_oldest).
    #[serde(default = "default_event_overflow")]
    pub event_overflow: OverflowPolicy,
}

/// Sizing of the process-wide global event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Publications retained for each lagging subscriber (default: 32).
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

fn default_intent_capacity() -> usize {
    64
}

fn default_intent_overflow() -> OverflowPolicy {
    OverflowPolicy::Spill
}

fn default_event_capacity() -> usize {
    32
}

fn default_event_overflow() -> OverflowPolicy {
    OverflowPolicy::DropOldest
}

fn default_bus_capacity() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            intent_capacity: default_intent_capacity(),
            intent_overflow: default_intent_overflow(),
            event_capacity: default_event_capacity(),
            event_overflow: default_event_overflow(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}
