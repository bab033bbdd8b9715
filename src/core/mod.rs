//! Core simulation types: particles, events, the event schedule and the
//! event-driven collision loop.

pub mod event;
pub mod particle;
pub mod schedule;
pub mod system;

pub use event::{Event, EventKind};
pub use particle::{Color, Particle};
pub use schedule::{by_priority_then_seq, EventSchedule, HeapKey, KeyOrder};
pub use system::{CollisionSystem, Observer, SimStats};
