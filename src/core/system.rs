use crate::config::RandomConfig;
use crate::core::particle::DIM;
use crate::core::{Event, EventKind, EventSchedule, Particle};
use crate::error::{Error, Result};
use crate::loader;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, instrument, trace};

/// Receives periodic snapshots when redraw markers fire during a run.
pub trait Observer {
    fn on_redraw(&mut self, time: f64, particles: &[Particle]);
}

impl<F: FnMut(f64, &[Particle])> Observer for F {
    fn on_redraw(&mut self, time: f64, particles: &[Particle]) {
        self(time, particles)
    }
}

/// Counters describing one `simulate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Valid events applied (collisions and redraws).
    pub events_processed: u64,
    /// Events popped after one of their participants had already moved on.
    pub stale_discarded: u64,
    pub particle_collisions: u64,
    pub wall_collisions: u64,
    pub redraws: u64,
}

/// Event-driven simulation of hard disks in the unit square.
///
/// Outside of `simulate`, every particle's position corresponds to `time()`.
#[derive(Debug)]
pub struct CollisionSystem {
    time_now: f64,
    particles: Vec<Particle>,
    schedule: EventSchedule<Event>,
    redraw_hz: Option<f64>,
}

impl CollisionSystem {
    /// Create a system from an explicit particle population.
    pub fn new(particles: Vec<Particle>) -> Result<Self> {
        if particles.is_empty() {
            return Err(Error::InvalidParam("at least one particle is required".into()));
        }
        Ok(Self {
            time_now: 0.0,
            particles,
            schedule: EventSchedule::new(),
            redraw_hz: None,
        })
    }

    /// Generate `cfg.count` non-overlapping disks with random positions and velocities.
    pub fn random(cfg: &RandomConfig) -> Result<Self> {
        cfg.validate()?;
        if cfg.count == 0 {
            return Err(Error::InvalidParam("count must be > 0".into()));
        }
        let mut rng: StdRng = match cfg.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        // Rejection sample non-overlapping initial positions
        let mut particles: Vec<Particle> = Vec::with_capacity(cfg.count);
        let max_attempts = 1_000_000usize;
        for id in 0..cfg.count {
            let mut attempts = 0usize;
            let p = loop {
                if attempts >= max_attempts {
                    return Err(Error::InvalidParam(format!(
                        "failed to place particle {id} without overlap; try fewer particles or a smaller radius"
                    )));
                }
                attempts += 1;
                let p = Particle::random(&mut rng, cfg)?;
                if !overlaps_existing(&particles, &p) {
                    break p;
                }
            };
            particles.push(p);
        }
        debug!(count = particles.len(), seed = ?cfg.seed, "generated random particles");
        Self::new(particles)
    }

    /// Load particles from a text file (see [`crate::loader`]).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(loader::load_particles_from_path(path)?)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::new(loader::load_particles(reader)?)
    }

    /// Repeat the redraw marker `hz` times per simulated time unit.
    pub fn with_redraw_hz(mut self, hz: f64) -> Result<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(Error::InvalidParam("redraw_hz must be finite and > 0".into()));
        }
        self.redraw_hz = Some(hz);
        Ok(self)
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn positions(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.r).collect()
    }

    pub fn velocities(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.v).collect()
    }

    /// Total kinetic energy (diagnostic; conserved by every collision).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Run until no event at or before `limit` remains.
    pub fn simulate(&mut self, limit: f64) -> Result<SimStats> {
        self.simulate_with(limit, &mut |_: f64, _: &[Particle]| {})
    }

    /// Run until no event at or before `limit` remains, reporting redraw markers to `observer`.
    ///
    /// The clock stops at the last processed event, not at `limit`.
    #[instrument(skip(self, observer), fields(n = self.particles.len()))]
    pub fn simulate_with<O: Observer + ?Sized>(
        &mut self,
        limit: f64,
        observer: &mut O,
    ) -> Result<SimStats> {
        if !limit.is_finite() || limit < self.time_now {
            return Err(Error::InvalidParam(format!(
                "limit must be finite and >= current time {}",
                self.time_now
            )));
        }

        self.schedule.clear();
        for i in 0..self.particles.len() {
            self.predict(Some(i), limit)?;
        }
        self.schedule.enqueue(self.time_now, Event::redraw(self.time_now)?);
        debug!(scheduled = self.schedule.len(), "seeded event schedule");
        info!(t = self.time_now, limit, "simulation started");

        let mut stats = SimStats::default();
        while !self.schedule.is_empty() {
            let ev = self.schedule.dequeue()?;
            if !ev.is_valid(&self.particles) {
                stats.stale_discarded += 1;
                trace!(t = ev.time(), kind = ?ev.kind(), "discarded stale event");
                continue;
            }

            self.drift_all(ev.time());
            stats.events_processed += 1;
            trace!(t = ev.time(), kind = ?ev.kind(), "processing event");

            match ev.kind() {
                EventKind::Pair { a, b } => {
                    let (pa, pb) = pair_mut(&mut self.particles, a, b)?;
                    pa.bounce_off(pb);
                    stats.particle_collisions += 1;
                }
                EventKind::VerticalWall { a } => {
                    self.particle_mut(a)?.bounce_off_vertical_wall();
                    stats.wall_collisions += 1;
                }
                EventKind::HorizontalWall { b } => {
                    self.particle_mut(b)?.bounce_off_horizontal_wall();
                    stats.wall_collisions += 1;
                }
                EventKind::Redraw => {
                    observer.on_redraw(self.time_now, &self.particles);
                    stats.redraws += 1;
                    self.schedule_redraw(limit)?;
                }
            }

            self.predict(ev.a(), limit)?;
            self.predict(ev.b(), limit)?;
        }

        info!(
            t = self.time_now,
            processed = stats.events_processed,
            stale = stats.stale_discarded,
            particle_collisions = stats.particle_collisions,
            wall_collisions = stats.wall_collisions,
            "simulation finished"
        );
        Ok(stats)
    }

    // ============ Internal helpers ============

    /// Schedule every future collision of particle `i` that happens no later than `limit`.
    fn predict(&mut self, i: Option<usize>, limit: f64) -> Result<()> {
        let Some(i) = i else {
            return Ok(());
        };
        let Self {
            time_now,
            particles,
            schedule,
            ..
        } = self;
        let now = *time_now;
        let particles: &[Particle] = particles;
        let p = particles.get(i).ok_or_else(|| {
            Error::InvalidParam(format!("particle index {i} out of range for {} particles", particles.len()))
        })?;

        for (j, other) in particles.iter().enumerate() {
            if j == i {
                continue;
            }
            let dt = p.time_to_hit(other);
            // A contact at or before `now` only counts if the disks are still closing;
            // tangent or separating pairs would otherwise bounce forever with zero impulse.
            if dt <= 0.0 && !p.is_approaching(other) {
                continue;
            }
            push_if_within(schedule, particles, now, dt, limit, EventKind::Pair { a: i, b: j })?;
        }
        let dt = p.time_to_hit_vertical_wall();
        push_if_within(schedule, particles, now, dt, limit, EventKind::VerticalWall { a: i })?;
        let dt = p.time_to_hit_horizontal_wall();
        push_if_within(schedule, particles, now, dt, limit, EventKind::HorizontalWall { b: i })?;
        Ok(())
    }

    fn schedule_redraw(&mut self, limit: f64) -> Result<()> {
        if let Some(hz) = self.redraw_hz {
            let t = self.time_now + 1.0 / hz;
            if t <= limit {
                self.schedule.enqueue(t, Event::redraw(t)?);
            }
        }
        Ok(())
    }

    /// Move every particle along its current velocity up to `to_time`.
    fn drift_all(&mut self, to_time: f64) {
        let dt = to_time - self.time_now;
        for p in &mut self.particles {
            p.advance(dt);
        }
        self.time_now = to_time;
    }

    fn particle_mut(&mut self, i: usize) -> Result<&mut Particle> {
        let n = self.particles.len();
        self.particles
            .get_mut(i)
            .ok_or_else(|| Error::InvalidParam(format!("particle index {i} out of range for {n} particles")))
    }
}

// ============ Utility helpers ============

fn push_if_within(
    schedule: &mut EventSchedule<Event>,
    particles: &[Particle],
    now: f64,
    dt: f64,
    limit: f64,
    kind: EventKind,
) -> Result<()> {
    // Overlapping disks (floating-point drift) can predict a contact in the past.
    let t = now + dt.max(0.0);
    if t <= limit {
        schedule.enqueue(t, Event::new(t, kind, particles)?);
    }
    Ok(())
}

/// Mutable references to two distinct particles.
fn pair_mut(ps: &mut [Particle], a: usize, b: usize) -> Result<(&mut Particle, &mut Particle)> {
    if a == b || a >= ps.len() || b >= ps.len() {
        return Err(Error::InvalidParam(format!(
            "invalid particle pair ({a}, {b}) for {} particles",
            ps.len()
        )));
    }
    if a < b {
        let (lo, hi) = ps.split_at_mut(b);
        Ok((&mut lo[a], &mut hi[0]))
    } else {
        let (lo, hi) = ps.split_at_mut(a);
        Ok((&mut hi[0], &mut lo[b]))
    }
}

fn overlaps_existing(existing: &[Particle], p: &Particle) -> bool {
    existing.iter().any(|q| {
        let dx = q.r[0] - p.r[0];
        let dy = q.r[1] - p.r[1];
        let min = q.radius() + p.radius();
        dx * dx + dy * dy < min * min
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Color;
    use approx::assert_relative_eq;

    fn disk(r: [f64; DIM], v: [f64; DIM], radius: f64) -> Particle {
        Particle::new(r, v, radius, 1.0, Color::BLACK).unwrap()
    }

    #[test]
    fn rejects_empty_population() {
        let err = CollisionSystem::new(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn rejects_bad_limit() -> Result<()> {
        let mut sys = CollisionSystem::new(vec![disk([0.5, 0.5], [0.1, 0.0], 0.01)])?;
        assert!(sys.simulate(f64::NAN).is_err());
        assert!(sys.simulate(-1.0).is_err());
        Ok(())
    }

    #[test]
    fn predict_enqueues_only_within_limit() -> Result<()> {
        let mut sys = CollisionSystem::new(vec![
            disk([0.2, 0.5], [0.1, 0.0], 0.05),
            disk([0.8, 0.5], [-0.1, 0.0], 0.05),
        ])?;
        // pair at 2.5 and walls at 7.5 for each particle
        sys.predict(Some(0), 3.0)?;
        assert_eq!(sys.schedule.len(), 1);
        let (t, ev) = sys.schedule.peek().expect("pair event");
        assert_relative_eq!(t, 2.5, epsilon = 1e-12);
        assert_eq!(ev.kind(), EventKind::Pair { a: 0, b: 1 });

        sys.schedule.clear();
        sys.predict(Some(1), 10.0)?;
        assert_eq!(sys.schedule.len(), 2);
        sys.predict(None, 10.0)?;
        assert_eq!(sys.schedule.len(), 2);
        Ok(())
    }

    #[test]
    fn pair_mut_returns_requested_order() -> Result<()> {
        let mut ps = vec![
            disk([0.1, 0.1], [0.0, 0.0], 0.01),
            disk([0.5, 0.5], [0.0, 0.0], 0.01),
        ];
        let (a, b) = pair_mut(&mut ps, 1, 0)?;
        assert_eq!(a.r, [0.5, 0.5]);
        assert_eq!(b.r, [0.1, 0.1]);
        assert!(pair_mut(&mut ps, 1, 1).is_err());
        assert!(pair_mut(&mut ps, 0, 2).is_err());
        Ok(())
    }

    #[test]
    fn random_population_does_not_overlap() -> Result<()> {
        let cfg = RandomConfig {
            count: 40,
            radius: 0.03,
            seed: Some(1234),
            ..RandomConfig::default()
        };
        let sys = CollisionSystem::random(&cfg)?;
        let ps = sys.particles();
        assert_eq!(ps.len(), 40);
        for (i, p) in ps.iter().enumerate() {
            assert!(p.r.iter().all(|&x| (0.03..=0.97).contains(&x)));
            assert!(!overlaps_existing(&ps[..i], p));
        }
        Ok(())
    }

    #[test]
    fn random_population_is_reproducible() -> Result<()> {
        let cfg = RandomConfig {
            count: 10,
            seed: Some(99),
            ..RandomConfig::default()
        };
        let a = CollisionSystem::random(&cfg)?;
        let b = CollisionSystem::random(&cfg)?;
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
        Ok(())
    }

    #[test]
    fn random_rejects_invalid_config_up_front() {
        let cfg = RandomConfig {
            radius: 0.6,
            seed: Some(1),
            ..RandomConfig::default()
        };
        let err = CollisionSystem::random(&cfg).unwrap_err();
        assert!(err.to_string().contains("radius"), "{err}");
    }

    #[test]
    fn predict_skips_sliding_contact() -> Result<()> {
        let mut sys = CollisionSystem::new(vec![
            disk([0.25, 0.25], [0.0, 0.0], 0.125),
            disk([0.25, 0.5], [0.125, 0.0], 0.125),
        ])?;
        sys.predict(Some(1), 1.0)?;
        assert!(sys.schedule.is_empty());
        Ok(())
    }

    #[test]
    fn impossible_packing_is_reported() {
        let cfg = RandomConfig {
            count: 50,
            radius: 0.2,
            seed: Some(5),
            ..RandomConfig::default()
        };
        let err = CollisionSystem::random(&cfg).unwrap_err();
        assert!(err.to_string().contains("without overlap"));
    }

    #[test]
    fn stationary_particle_only_redraws() -> Result<()> {
        let mut sys = CollisionSystem::new(vec![disk([0.5, 0.5], [0.0, 0.0], 0.1)])?;
        let stats = sys.simulate(10.0)?;
        assert_eq!(stats.redraws, 1);
        assert_eq!(stats.events_processed, 1);
        assert_eq!(sys.time(), 0.0);
        Ok(())
    }

    #[test]
    fn redraws_follow_configured_rate() -> Result<()> {
        let mut sys =
            CollisionSystem::new(vec![disk([0.5, 0.5], [0.0, 0.0], 0.1)])?.with_redraw_hz(0.5)?;
        let mut seen = Vec::new();
        let stats = sys.simulate_with(7.0, &mut |t: f64, ps: &[Particle]| {
            assert_eq!(ps.len(), 1);
            seen.push(t);
        })?;
        assert_eq!(seen, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(stats.redraws, 4);
        assert_eq!(sys.time(), 6.0);
        Ok(())
    }

    #[test]
    fn invalid_redraw_rate_rejected() -> Result<()> {
        let sys = CollisionSystem::new(vec![disk([0.5, 0.5], [0.0, 0.0], 0.1)])?;
        assert!(sys.with_redraw_hz(0.0).is_err());
        Ok(())
    }
}
