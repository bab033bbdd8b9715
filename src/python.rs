use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::RandomConfig;
use crate::core::particle::DIM;
use crate::core::CollisionSystem;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python-facing wrapper around the Rust `CollisionSystem`.
///
/// API:
/// - CollisionSim.from_file(path)
/// - CollisionSim.random(count, radius=0.02, mass=0.5, max_speed=0.005, seed=None)
/// - simulate(limit) -> dict of run statistics
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 2)
#[pyclass]
pub struct CollisionSim {
    sys: CollisionSystem,
}

#[pymethods]
impl CollisionSim {
    /// Load particles from a text file: a count line followed by
    /// `RX RY VX VY RADIUS MASS R G B` records.
    ///
    /// Errors: raises ValueError on I/O failure or malformed records.
    #[staticmethod]
    fn from_file(path: &str) -> PyResult<Self> {
        let sys = CollisionSystem::from_path(path).map_err(py_err)?;
        Ok(Self { sys })
    }

    /// Generate `count` non-overlapping disks with random positions and velocities.
    #[staticmethod]
    #[pyo3(signature = (count, radius=0.02, mass=0.5, max_speed=0.005, seed=None))]
    fn random(count: usize, radius: f64, mass: f64, max_speed: f64, seed: Option<u64>) -> PyResult<Self> {
        let cfg = RandomConfig {
            count,
            radius,
            mass,
            max_speed,
            seed,
        };
        let sys = CollisionSystem::random(&cfg).map_err(py_err)?;
        Ok(Self { sys })
    }

    /// Run the simulation up to `limit` (releases the GIL during computation).
    ///
    /// Returns: dict with keys events_processed, stale_discarded, particle_collisions,
    /// wall_collisions, redraws
    fn simulate<'py>(&mut self, py: Python<'py>, limit: f64) -> PyResult<Bound<'py, PyDict>> {
        let stats = py
            .detach(|| self.sys.simulate(limit))
            .map_err(py_err)?;
        let out = PyDict::new(py);
        out.set_item("events_processed", stats.events_processed)?;
        out.set_item("stale_discarded", stats.stale_discarded)?;
        out.set_item("particle_collisions", stats.particle_collisions)?;
        out.set_item("wall_collisions", stats.wall_collisions)?;
        out.set_item("redraws", stats.redraws)?;
        Ok(out)
    }

    /// Current simulation time.
    fn time(&self) -> f64 {
        self.sys.time()
    }

    /// Total kinetic energy.
    fn kinetic_energy(&self) -> f64 {
        self.sys.kinetic_energy()
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array(&self.sys.positions()).into_pyarray(py).unbind())
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array(&self.sys.velocities()).into_pyarray(py).unbind())
    }

    /// Return per-particle collision counts as a NumPy array of shape (N,).
    fn get_collision_counts(&self, py: Python<'_>) -> PyResult<Py<PyArray1<u64>>> {
        let counts: Vec<u64> = self
            .sys
            .particles()
            .iter()
            .map(|p| p.collision_count())
            .collect();
        Ok(counts.into_pyarray(py).unbind())
    }
}

fn to_array(rows: &[[f64; DIM]]) -> Array2<f64> {
    let mut arr = Array2::<f64>::zeros((rows.len(), DIM));
    for (i, row) in rows.iter().enumerate() {
        for k in 0..DIM {
            arr[[i, k]] = row[k];
        }
    }
    arr
}

/// The collsim Python module entry point.
#[pymodule]
fn collsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CollisionSim>()?;
    Ok(())
}
