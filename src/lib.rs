//! Event-driven simulation of elastic collisions between hard disks in the unit square.
//!
//! Time advances from one predicted collision to the next. Predictions go into a
//! binary min-heap; predictions invalidated by an earlier bounce are recognised by
//! their collision-count snapshots and dropped when popped.
//!
//! ```no_run
//! use collsim::config::RandomConfig;
//! use collsim::core::CollisionSystem;
//!
//! # fn main() -> collsim::error::Result<()> {
//! let cfg = RandomConfig { count: 50, seed: Some(1), ..RandomConfig::default() };
//! let mut sys = CollisionSystem::random(&cfg)?;
//! let stats = sys.simulate(1000.0)?;
//! println!("{} collisions, E = {}", stats.particle_collisions, sys.kinetic_energy());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod loader;

#[cfg(feature = "python")]
mod python;
