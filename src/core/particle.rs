use crate::config::RandomConfig;
use crate::error::{Error, Result};
use rand::Rng;
use std::str::FromStr;

/// Fixed spatial dimension (2D, unit square).
pub const DIM: usize = 2;

/// Opaque display attribute carried through from the particle source. Irrelevant to physics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A hard disk moving inside the unit square.
///
/// Fields:
/// - `r`: position [x, y]
/// - `v`: velocity [vx, vy]
///
/// Radius, mass and color are fixed at construction. The collision counter only
/// moves forward, once per bounce, and is what events snapshot for invalidation.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    radius: f64,
    mass: f64,
    color: Color,
    collision_count: u64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(r: [f64; DIM], v: [f64; DIM], radius: f64, mass: f64, color: Color) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            r,
            v,
            radius,
            mass,
            color,
            collision_count: 0,
        })
    }

    /// Draw a particle with position uniform in `[radius, 1 - radius]^2` and each
    /// velocity component uniform in `[-max_speed, max_speed]`.
    ///
    /// `cfg` must already have passed [`RandomConfig::validate`].
    pub(crate) fn random<R: Rng>(rng: &mut R, cfg: &RandomConfig) -> Result<Self> {
        let mut r = [0.0_f64; DIM];
        r.iter_mut()
            .for_each(|x| *x = rng.random_range(cfg.radius..=1.0 - cfg.radius));
        let mut v = [0.0_f64; DIM];
        v.iter_mut()
            .for_each(|x| *x = rng.random_range(-cfg.max_speed..=cfg.max_speed));
        Self::new(r, v, cfg.radius, cfg.mass, Color::BLACK)
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Number of collisions (particle or wall) this particle has taken part in.
    #[inline]
    pub fn collision_count(&self) -> u64 {
        self.collision_count
    }

    #[inline]
    fn bump_collision_count(&mut self) {
        self.collision_count = self.collision_count.saturating_add(1);
    }

    /// Advance the position along the current velocity for `dt` time units.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        for (x, &vx) in self.r.iter_mut().zip(self.v.iter()) {
            *x += vx * dt;
        }
    }

    /// Time until this particle touches `other`, or `f64::INFINITY` if it never will
    /// on current trajectories.
    pub fn time_to_hit(&self, other: &Particle) -> f64 {
        if std::ptr::eq(self, other) {
            return f64::INFINITY;
        }
        let dx = other.r[0] - self.r[0];
        let dy = other.r[1] - self.r[1];
        let dvx = other.v[0] - self.v[0];
        let dvy = other.v[1] - self.v[1];
        let dvdr = dx * dvx + dy * dvy;
        if dvdr > 0.0 {
            return f64::INFINITY;
        }
        let dvdv = dvx * dvx + dvy * dvy;
        if dvdv == 0.0 {
            return f64::INFINITY;
        }
        let drdr = dx * dx + dy * dy;
        let sigma = self.radius + other.radius;
        let d = dvdr * dvdr - dvdv * (drdr - sigma * sigma);
        if d < 0.0 {
            return f64::INFINITY;
        }
        -(dvdr + d.sqrt()) / dvdv
    }

    /// True iff the centres are closing on each other (relative velocity points along
    /// the line of centres towards contact).
    #[inline]
    pub fn is_approaching(&self, other: &Particle) -> bool {
        let dx = other.r[0] - self.r[0];
        let dy = other.r[1] - self.r[1];
        let dvx = other.v[0] - self.v[0];
        let dvy = other.v[1] - self.v[1];
        dx * dvx + dy * dvy < 0.0
    }

    /// Time until the disk edge reaches the wall at x = 0 or x = 1.
    #[inline]
    pub fn time_to_hit_vertical_wall(&self) -> f64 {
        time_to_wall(self.r[0], self.v[0], self.radius)
    }

    /// Time until the disk edge reaches the wall at y = 0 or y = 1.
    #[inline]
    pub fn time_to_hit_horizontal_wall(&self) -> f64 {
        time_to_wall(self.r[1], self.v[1], self.radius)
    }

    /// Elastic collision with `other`: exchange an impulse along the line of centres
    /// and bump both collision counters.
    ///
    /// Assumes the disks are in contact, so the centre distance equals the sum of radii.
    pub fn bounce_off(&mut self, other: &mut Particle) {
        let dx = other.r[0] - self.r[0];
        let dy = other.r[1] - self.r[1];
        let dvx = other.v[0] - self.v[0];
        let dvy = other.v[1] - self.v[1];
        let dvdr = dx * dvx + dy * dvy;
        let dist = self.radius + other.radius;

        // impulse magnitude along the normal
        let magnitude = 2.0 * self.mass * other.mass * dvdr / ((self.mass + other.mass) * dist);
        let fx = magnitude * dx / dist;
        let fy = magnitude * dy / dist;

        self.v[0] += fx / self.mass;
        self.v[1] += fy / self.mass;
        other.v[0] -= fx / other.mass;
        other.v[1] -= fy / other.mass;

        self.bump_collision_count();
        other.bump_collision_count();
    }

    /// Specular reflection off a vertical wall.
    #[inline]
    pub fn bounce_off_vertical_wall(&mut self) {
        self.v[0] = -self.v[0];
        self.bump_collision_count();
    }

    /// Specular reflection off a horizontal wall.
    #[inline]
    pub fn bounce_off_horizontal_wall(&mut self) {
        self.v[1] = -self.v[1];
        self.bump_collision_count();
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        let vsq: f64 = self.v.iter().map(|&c| c * c).sum();
        0.5 * self.mass * vsq
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.v.iter().map(|&c| c * c).sum::<f64>().sqrt()
    }
}

#[inline]
fn time_to_wall(x: f64, v: f64, radius: f64) -> f64 {
    if v > 0.0 {
        (1.0 - x - radius) / v
    } else if v < 0.0 {
        (radius - x) / v
    } else {
        f64::INFINITY
    }
}

/// Number of whitespace-separated fields in a particle record: `RX RY VX VY RADIUS MASS R G B`.
pub const RECORD_FIELDS: usize = 9;

impl FromStr for Particle {
    type Err = Error;

    /// Parse a single particle record. The returned parse error reports line 0;
    /// the loader rewrites it with the real line number.
    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != RECORD_FIELDS {
            return Err(record_error(format!(
                "expected {} fields, found {}",
                RECORD_FIELDS,
                fields.len()
            )));
        }
        let mut nums = [0.0_f64; 6];
        for (k, (slot, raw)) in nums.iter_mut().zip(&fields[..6]).enumerate() {
            *slot = raw
                .parse::<f64>()
                .map_err(|e| record_error(format!("field {} ({raw:?}): {e}", k + 1)))?;
        }
        let mut rgb = [0u8; 3];
        for (k, (slot, raw)) in rgb.iter_mut().zip(&fields[6..]).enumerate() {
            *slot = raw
                .parse::<u8>()
                .map_err(|e| record_error(format!("field {} ({raw:?}): {e}", k + 7)))?;
        }
        let [rx, ry, vx, vy, radius, mass] = nums;
        Particle::new(
            [rx, ry],
            [vx, vy],
            radius,
            mass,
            Color::new(rgb[0], rgb[1], rgb[2]),
        )
    }
}

fn record_error(reason: String) -> Error {
    Error::Parse { line: 0, reason }
}
