//! Text loader for particle populations.
//!
//! Format: the first non-empty line holds the particle count `N`; the next `N`
//! lines each hold one record `RX RY VX VY RADIUS MASS R G B`.

use crate::core::Particle;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Read particles from a file on disk.
pub fn load_particles_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Particle>> {
    let path = path.as_ref();
    let particles = load_particles(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), count = particles.len(), "loaded particles");
    Ok(particles)
}

/// Read particles from any buffered reader.
pub fn load_particles<R: BufRead>(reader: R) -> Result<Vec<Particle>> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !matches!(l, Ok(s) if s.trim().is_empty()));

    let (count_line, header) = match lines.next() {
        Some((n, l)) => (n, l?),
        None => {
            return Err(Error::Parse {
                line: 1,
                reason: "missing particle count".into(),
            })
        }
    };
    let count: usize = header.trim().parse().map_err(|e| Error::Parse {
        line: count_line,
        reason: format!("invalid particle count {:?}: {e}", header.trim()),
    })?;

    let mut particles = Vec::with_capacity(count);
    let mut last_line = count_line;
    for (n, line) in lines.by_ref().take(count) {
        last_line = n;
        let p = line?.parse::<Particle>().map_err(|e| match e {
            Error::Parse { reason, .. } => Error::Parse { line: n, reason },
            Error::InvalidParam(reason) => Error::Parse { line: n, reason },
            other => other,
        })?;
        particles.push(p);
    }
    if particles.len() < count {
        return Err(Error::Parse {
            line: last_line + 1,
            reason: format!("expected {count} particles, found {}", particles.len()),
        });
    }
    Ok(particles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn loads_records() -> Result<()> {
        let text = "2\n0.2 0.5 0.1 0 0.05 1 255 0 0\n0.8 0.5 -0.1 0 0.05 1 0 0 255\n\n";
        let ps = load_particles(Cursor::new(text))?;
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].r, [0.2, 0.5]);
        assert_eq!(ps[1].v, [-0.1, 0.0]);
        Ok(())
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = load_particles(Cursor::new("")).unwrap_err();
        assert!(err.to_string().contains("missing particle count"));
    }

    #[test]
    fn bad_count_reports_line() {
        let err = load_particles(Cursor::new("two\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn malformed_record_reports_its_line() {
        let text = "2\n0.2 0.5 0.1 0 0.05 1 0 0 0\n0.8 0.5 -0.1\n";
        let err = load_particles(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn invalid_physics_reports_its_line() {
        let text = "1\n0.2 0.5 0.1 0 -0.05 1 0 0 0\n";
        let err = load_particles(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn too_few_records() {
        let err = load_particles(Cursor::new("3\n0.2 0.5 0.1 0 0.05 1 0 0 0\n")).unwrap_err();
        assert!(err.to_string().contains("expected 3 particles, found 1"));
    }
}
