use crate::core::Particle;
use crate::error::{Error, Result};
use ordered_float::NotNan;

/// What a scheduled event is about. Participants are indices into the system's particle array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Collision between particles `a` and `b`.
    Pair { a: usize, b: usize },
    /// Particle `a` reaches the left or right wall.
    VerticalWall { a: usize },
    /// Particle `b` reaches the top or bottom wall.
    HorizontalWall { b: usize },
    /// Periodic repaint marker with no participants. Always valid.
    Redraw,
}

impl EventKind {
    /// The (A, B) participant view: a vertical-wall hit has only A, a horizontal-wall hit only B.
    #[inline]
    pub fn participants(&self) -> (Option<usize>, Option<usize>) {
        match *self {
            EventKind::Pair { a, b } => (Some(a), Some(b)),
            EventKind::VerticalWall { a } => (Some(a), None),
            EventKind::HorizontalWall { b } => (None, Some(b)),
            EventKind::Redraw => (None, None),
        }
    }
}

/// An immutable prediction of something that will happen at `time`.
///
/// Each present participant's collision count is captured at creation; an absent
/// participant stores `None`. The event goes stale as soon as any present
/// participant bounces again, which is how the schedule avoids ever removing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    time: NotNan<f64>,
    kind: EventKind,
    cc_a: Option<u64>,
    cc_b: Option<u64>,
}

impl Event {
    /// Create a new event, snapshotting the collision counts of its participants.
    ///
    /// Errors: `Error::InvalidParam` if `time` is not finite or a participant index is out of range.
    pub fn new(time: f64, kind: EventKind, particles: &[Particle]) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::InvalidParam("event time must be finite".into()));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("event time cannot be NaN".into()))?;
        let (a, b) = kind.participants();
        Ok(Self {
            time,
            kind,
            cc_a: snapshot(particles, a)?,
            cc_b: snapshot(particles, b)?,
        })
    }

    /// A redraw marker at `time`.
    pub fn redraw(time: f64) -> Result<Self> {
        Self::new(time, EventKind::Redraw, &[])
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time.into_inner()
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn a(&self) -> Option<usize> {
        self.kind.participants().0
    }

    #[inline]
    pub fn b(&self) -> Option<usize> {
        self.kind.participants().1
    }

    /// True iff no present participant has collided since this event was created.
    pub fn is_valid(&self, particles: &[Particle]) -> bool {
        let (a, b) = self.kind.participants();
        unchanged(particles, a, self.cc_a) && unchanged(particles, b, self.cc_b)
    }
}

fn snapshot(particles: &[Particle], idx: Option<usize>) -> Result<Option<u64>> {
    match idx {
        None => Ok(None),
        Some(i) => particles
            .get(i)
            .map(|p| Some(p.collision_count()))
            .ok_or_else(|| {
                Error::InvalidParam(format!(
                    "particle index {i} out of range for {} particles",
                    particles.len()
                ))
            }),
    }
}

#[inline]
fn unchanged(particles: &[Particle], idx: Option<usize>, cc: Option<u64>) -> bool {
    match (idx, cc) {
        (Some(i), Some(cc)) => particles
            .get(i)
            .is_some_and(|p| p.collision_count() == cc),
        (None, _) => true,
        // Present participant without a snapshot cannot be produced by `Event::new`.
        (Some(_), None) => false,
    }
}
