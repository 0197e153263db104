use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use crate::{
    config::Params,
    geometry::ObstacleMask,
    grid::Distribution,
    lattice::{D2Q9, Macroscopic},
    solver::Simulation,
    Float,
};

pub const FINAL_STATE_FILE: &str = "final_state.dat";
pub const AV_VELS_FILE: &str = "av_vels.dat";

/// Writes the final flow field and the average-velocity history.
pub struct ResultWriter {
    output_directory: PathBuf,
}

impl ResultWriter {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }

    pub fn write_all(&self, simulation: &Simulation) -> Result<()> {
        self.write_final_state(simulation.params(), simulation.obstacles(), simulation.distribution())?;
        self.write_av_vels(simulation.av_vels())?;
        Ok(())
    }

    pub fn write_final_state(&self, params: &Params, obstacles: &ObstacleMask, grid: &Distribution) -> Result<PathBuf> {
        let path = self.output_directory.join(FINAL_STATE_FILE);
        let mut file = create(&path)?;
        write_final_state(&mut file, params, obstacles, grid)
            .and_then(|_| file.flush())
            .with_context(|| format!("could not write output file: {}", path.display()))?;

        info!("Wrote final state: {}", path.display());
        Ok(path)
    }

    pub fn write_av_vels(&self, av_vels: &[Float]) -> Result<PathBuf> {
        let path = self.output_directory.join(AV_VELS_FILE);
        let mut file = create(&path)?;
        write_av_vels(&mut file, av_vels)
            .and_then(|_| file.flush())
            .with_context(|| format!("could not write output file: {}", path.display()))?;

        info!("Wrote average velocities: {}", path.display());
        Ok(path)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("could not open output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One line per cell, row-major: `i j u_x u_y |u| pressure obstacle`.
/// Obstacle cells report zero velocity and the reference pressure.
pub fn write_final_state<W: Write>(
    out: &mut W,
    params: &Params,
    obstacles: &ObstacleMask,
    grid: &Distribution,
) -> std::io::Result<()> {
    for j in 0..params.ny {
        for i in 0..params.nx {
            let idx = grid.idx(i, j);
            let solid = obstacles.is_obstacle(idx);

            let (u_x, u_y, u, pressure) = if solid {
                (0.0, 0.0, 0.0, params.density * D2Q9::CS2)
            } else {
                let cell = Macroscopic::from_distributions(&grid.cell(idx));
                (cell.velocity.x, cell.velocity.y, cell.speed(), cell.pressure())
            };

            writeln!(out, "{} {} {} {} {} {} {}",
                     i, j, sci(u_x), sci(u_y), sci(u), sci(pressure), solid as u8)?;
        }
    }
    Ok(())
}

/// One line per timestep: `step:\tvalue`.
pub fn write_av_vels<W: Write>(out: &mut W, av_vels: &[Float]) -> std::io::Result<()> {
    for (step, av_vel) in av_vels.iter().enumerate() {
        writeln!(out, "{}:\t{}", step, sci(*av_vel))?;
    }
    Ok(())
}

/// Format like C's `%.12E`: signed exponent with at least two digits.
pub fn sci(value: Float) -> String {
    let value = value as f64;
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }

    let formatted = format!("{:.12E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}E{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}
