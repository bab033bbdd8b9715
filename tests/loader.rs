use collsim::core::{Color, CollisionSystem};
use collsim::error::{Error, Result};
use collsim::loader::load_particles_from_path;
use std::io::Cursor;

#[test]
fn loads_sample_file() -> Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/head_on.txt");
    let ps = load_particles_from_path(path)?;
    assert_eq!(ps.len(), 2);
    assert_eq!(ps[0].color(), Color::new(255, 0, 0));
    assert_eq!(ps[1].color(), Color::new(0, 0, 255));
    assert_eq!(ps[1].radius(), 0.05);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let err = CollisionSystem::from_path("/definitely/not/here.txt").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn system_from_reader_runs() -> Result<()> {
    let text = "1\n0.95 0.5 0.1 0 0.02 1 0 0 0\n";
    let mut sys = CollisionSystem::from_reader(Cursor::new(text))?;
    let stats = sys.simulate(1.0)?;
    assert_eq!(stats.wall_collisions, 1);
    Ok(())
}

#[test]
fn zero_particles_rejected_by_system() {
    let err = CollisionSystem::from_reader(Cursor::new("0\n")).unwrap_err();
    assert!(matches!(err, Error::InvalidParam(_)));
}
