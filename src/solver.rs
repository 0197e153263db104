use anyhow::{Result, ensure};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::time::{Duration, Instant};
use crate::{
    config::Params,
    geometry::ObstacleMask,
    grid::Distribution,
    kernel,
    Float,
};

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initialized,
    Running,
    Finished,
}

/// Wall-clock time spent in each part of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timings {
    pub init: Duration,
    pub compute: Duration,
    pub collate: Duration,
}

impl Timings {
    pub fn total(&self) -> Duration {
        self.init + self.compute + self.collate
    }
}

pub struct Simulation {
    params: Params,
    obstacles: ObstacleMask,
    current: Distribution,
    scratch: Distribution,
    av_vels: Vec<Float>,
    iteration: usize,
    timings: Timings,
}

impl Simulation {
    /// Load parameters and obstacles from disk and set up the initial state.
    pub fn from_files(param_path: impl AsRef<Path>, obstacle_path: impl AsRef<Path>) -> Result<Self> {
        let started = Instant::now();

        let params = Params::from_file(param_path)?;
        info!("Domain: {}x{}, {} iterations", params.nx, params.ny, params.max_iters);
        info!("density={} accel={} omega={} (tau={})",
              params.density, params.accel, params.omega, params.tau());

        let obstacles = ObstacleMask::from_file(obstacle_path, &params)?;

        let mut simulation = Self::new(params, obstacles)?;
        simulation.timings.init = started.elapsed();
        Ok(simulation)
    }

    /// Both buffers start at the rest equilibrium for the reference density.
    pub fn new(params: Params, obstacles: ObstacleMask) -> Result<Self> {
        Self::with_state(params, obstacles, None)
    }

    /// Start from a given distribution instead of the rest equilibrium.
    pub fn with_initial_state(params: Params, obstacles: ObstacleMask, initial: Distribution) -> Result<Self> {
        Self::with_state(params, obstacles, Some(initial))
    }

    fn with_state(params: Params, obstacles: ObstacleMask, initial: Option<Distribution>) -> Result<Self> {
        params.validate()?;
        ensure!((obstacles.nx(), obstacles.ny()) == (params.nx, params.ny),
                "obstacle mask is {}x{} but the domain is {}x{}",
                obstacles.nx(), obstacles.ny(), params.nx, params.ny);
        if let Some(initial) = &initial {
            ensure!((initial.nx(), initial.ny()) == (params.nx, params.ny),
                    "initial state is {}x{} but the domain is {}x{}",
                    initial.nx(), initial.ny(), params.nx, params.ny);
        }

        let current = initial
            .unwrap_or_else(|| Distribution::uniform(params.nx, params.ny, params.density));
        let scratch = Distribution::uniform(params.nx, params.ny, params.density);

        if obstacles.fluid_count() == 0 {
            warn!("Domain has no fluid cells; average velocity is reported as 0");
        }

        Ok(Self {
            av_vels: Vec::with_capacity(params.max_iters),
            params,
            obstacles,
            current,
            scratch,
            iteration: 0,
            timings: Timings::default(),
        })
    }

    /// Accelerate, then stream/collide from current into scratch, then swap.
    /// Returns the average fluid velocity of the step.
    pub fn step(&mut self) -> Float {
        kernel::accelerate_flow(&self.params, &self.obstacles, &mut self.current);
        let av_vel = kernel::fused_step(&self.params, &self.obstacles, &self.current, &mut self.scratch);
        std::mem::swap(&mut self.current, &mut self.scratch);

        self.av_vels.push(av_vel);
        self.iteration += 1;

        debug!("timestep {}: av velocity {:.12E}, tot density {:.12E}",
               self.iteration - 1, av_vel, self.current.total_density());
        av_vel
    }

    /// Run the remaining timesteps up to `max_iters`.
    pub fn run(&mut self) {
        let remaining = self.params.max_iters.saturating_sub(self.iteration);
        info!("Starting simulation for {} iterations", remaining);

        let progress = ProgressBar::with_draw_target(Some(remaining as u64), ProgressDrawTarget::stderr());
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} steps [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let started = Instant::now();
        while self.phase() != Phase::Finished {
            let av_vel = self.step();
            progress.inc(1);
            if self.iteration % 100 == 0 {
                progress.set_message(format!("av velocity {av_vel:.6E}"));
            }
        }
        self.timings.compute += started.elapsed();
        progress.finish_and_clear();

        info!("Simulation completed {} iterations", self.iteration);
    }

    pub fn phase(&self) -> Phase {
        if self.iteration >= self.params.max_iters {
            Phase::Finished
        } else if self.iteration == 0 {
            Phase::Initialized
        } else {
            Phase::Running
        }
    }

    /// Average fluid velocity of the current distribution.
    pub fn av_velocity(&self) -> Float {
        kernel::av_velocity(&self.obstacles, &self.current)
    }

    /// Reynolds number from the current average velocity.
    pub fn reynolds(&self) -> Float {
        self.av_velocity() * self.params.reynolds_dim as Float / self.params.viscosity()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn obstacles(&self) -> &ObstacleMask {
        &self.obstacles
    }

    pub fn distribution(&self) -> &Distribution {
        &self.current
    }

    pub fn av_vels(&self) -> &[Float] {
        &self.av_vels
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn record_collate(&mut self, elapsed: Duration) {
        self.timings.collate += elapsed;
    }
}
