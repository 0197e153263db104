use anyhow::{Context, Result, anyhow, bail};
use std::num::IntErrorKind;
use log::{info, warn};
use std::path::Path;
use crate::config::Params;

/// Per-cell solid flags over the `nx * ny` grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMask {
    nx: usize,
    ny: usize,
    solid: Vec<bool>,
}

impl ObstacleMask {
    /// A domain with no obstacles.
    pub fn empty(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            solid: vec![false; nx * ny],
        }
    }

    /// A domain where every cell is solid.
    pub fn full(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            solid: vec![true; nx * ny],
        }
    }

    pub fn from_file(path: impl AsRef<Path>, params: &Params) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not open input obstacles file: {}", path.display()))?;

        let mask = Self::parse(&content, params.nx, params.ny, &path.display().to_string())?;
        info!("Loaded {} obstacle cells, {} fluid cells from {}",
              mask.obstacle_count(), mask.fluid_count(), path.display());
        Ok(mask)
    }

    /// Parse `x y blocked` lines. `source` names the input in diagnostics.
    pub fn parse(text: &str, nx: usize, ny: usize, source: &str) -> Result<Self> {
        let mut mask = Self::empty(nx, ny);
        let mut duplicates = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let values: Vec<&str> = line.split_whitespace().collect();
            if values.is_empty() {
                continue;
            }

            let parsed: Option<Vec<Option<i64>>> = values.iter().map(|v| integer(v)).collect();
            let [x, y, blocked] = match parsed.as_deref() {
                Some(&[x, y, blocked]) => [x, y, blocked],
                _ => bail!("expected 3 values per line in obstacle file at {source}:{line_no}"),
            };

            let i = index_below(x, nx).ok_or_else(|| {
                anyhow!("obstacle x-coord out of range at {source}:{line_no}: {}", values[0])
            })?;
            let j = index_below(y, ny).ok_or_else(|| {
                anyhow!("obstacle y-coord out of range at {source}:{line_no}: {}", values[1])
            })?;
            if blocked != Some(1) {
                bail!("obstacle blocked value should be 1 at {source}:{line_no}: {}", values[2]);
            }

            if mask.is_solid(i, j) {
                duplicates += 1;
            }
            mask.block(i, j);
        }

        if duplicates > 0 {
            warn!("{duplicates} obstacle cells listed more than once in {source}");
        }

        Ok(mask)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn block(&mut self, i: usize, j: usize) {
        self.solid[i + j * self.nx] = true;
    }

    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.solid[i + j * self.nx]
    }

    #[inline]
    pub fn is_obstacle(&self, idx: usize) -> bool {
        self.solid[idx]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.solid
    }

    pub fn obstacle_count(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    pub fn fluid_count(&self) -> usize {
        self.solid.len() - self.obstacle_count()
    }
}

/// `Some(None)` for an integer too large for `i64`, `None` for anything else
/// that is not an integer.
fn integer(token: &str) -> Option<Option<i64>> {
    match token.parse::<i64>() {
        Ok(value) => Some(Some(value)),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => Some(None),
        Err(_) => None,
    }
}

fn index_below(value: Option<i64>, limit: usize) -> Option<usize> {
    value.and_then(|v| usize::try_from(v).ok()).filter(|&v| v < limit)
}
