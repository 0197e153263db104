use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};
use crate::{lattice::D2Q9, Float};

/// Simulation parameters, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Cells in the x-direction
    pub nx: usize,
    /// Cells in the y-direction
    pub ny: usize,
    /// Number of timesteps to run
    pub max_iters: usize,
    /// Length scale used for the Reynolds number
    pub reynolds_dim: usize,
    /// Reference density per link
    pub density: Float,
    /// Density redistributed by the acceleration stage
    pub accel: Float,
    /// Relaxation rate
    pub omega: Float,
}

impl Params {
    /// Load parameters from disk. Files ending in `.json` are read as JSON,
    /// everything else as the plain-text format (one value per line).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not open input parameter file: {}", path.display()))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let params = if is_json {
            Self::from_json(&content)
        } else {
            Self::parse(&content)
        };
        params.with_context(|| format!("invalid parameter file: {}", path.display()))
    }

    /// Parse the plain-text format: `nx`, `ny`, `maxIters`, `reynolds_dim`,
    /// `density`, `accel`, `omega`, in that order, whitespace separated.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();

        let nx: i64 = next_value(&mut tokens, "nx")?;
        let ny: i64 = next_value(&mut tokens, "ny")?;
        let max_iters: i64 = next_value(&mut tokens, "maxIters")?;
        let reynolds_dim: i64 = next_value(&mut tokens, "reynolds_dim")?;
        let density: Float = next_value(&mut tokens, "density")?;
        let accel: Float = next_value(&mut tokens, "accel")?;
        let omega: Float = next_value(&mut tokens, "omega")?;

        let params = Self {
            nx: non_negative("nx", nx)?,
            ny: non_negative("ny", ny)?,
            max_iters: non_negative("maxIters", max_iters)?,
            reynolds_dim: non_negative("reynolds_dim", reynolds_dim)?,
            density,
            accel,
            omega,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nx == 0 {
            bail!("nx must be positive");
        }
        if self.ny < 2 {
            bail!("ny must be at least 2 (row ny - 2 is accelerated), got {}", self.ny);
        }
        let bytes = self
            .nx
            .checked_mul(self.ny)
            .and_then(|cells| cells.checked_mul(D2Q9::Q * std::mem::size_of::<Float>()))
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if bytes.is_none() {
            bail!("grid of nx * ny = {} x {} cells is too large", self.nx, self.ny);
        }
        if self.reynolds_dim == 0 {
            bail!("reynolds_dim must be positive");
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            bail!("density must be positive, got {}", self.density);
        }
        if !self.accel.is_finite() {
            bail!("accel must be finite, got {}", self.accel);
        }
        if !(self.omega > 0.0 && self.omega < 2.0) {
            bail!("omega must lie in (0, 2), got {}", self.omega);
        }
        Ok(())
    }

    pub fn cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Row that receives the driving acceleration.
    pub fn accelerated_row(&self) -> usize {
        self.ny - 2
    }

    /// Kinematic viscosity in lattice units, (1/6)(2/omega - 1).
    pub fn viscosity(&self) -> Float {
        1.0 / 6.0 * (2.0 / self.omega - 1.0)
    }

    /// Relaxation time.
    pub fn tau(&self) -> Float {
        1.0 / self.omega
    }
}

fn next_value<T: FromStr>(tokens: &mut SplitWhitespace<'_>, field: &str) -> Result<T> {
    tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| anyhow!("could not read param file: {field}"))
}

fn non_negative(field: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| anyhow!("{field} must not be negative, got {value}"))
}
