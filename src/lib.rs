pub mod config;
pub mod geometry;
pub mod grid;
pub mod kernel;
pub mod lattice;
pub mod output;
pub mod solver;

pub use config::Params;
pub use geometry::ObstacleMask;
pub use grid::{AlignedField, Distribution};
pub use lattice::{D2Q9, Macroscopic};
pub use output::ResultWriter;
pub use solver::{Phase, Simulation, Timings};

pub type Float = f32;
