use approx::{assert_abs_diff_eq, assert_relative_eq};
use d2q9_bgk::{D2Q9, Distribution, Macroscopic, ObstacleMask, Params, ResultWriter, Simulation};
use std::fs;
use std::path::PathBuf;

fn params(nx: usize, ny: usize, max_iters: usize, accel: f32) -> Params {
    Params {
        nx,
        ny,
        max_iters,
        reynolds_dim: nx,
        density: 0.1,
        accel,
        omega: 1.7,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("d2q9-bgk-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn accelerated_channel_speeds_up_and_keeps_mass() {
    let p = params(128, 128, 1000, 0.005);
    let mut sim = Simulation::new(p, ObstacleMask::empty(128, 128)).unwrap();
    let before = sim.distribution().total_density();

    sim.run();

    let after = sim.distribution().total_density();
    assert!((after - before).abs() < 1e-3 * before, "{before} -> {after}");

    let samples: Vec<f32> = sim.av_vels().iter().step_by(100).copied().collect();
    assert_eq!(samples.len(), 10);
    assert!(samples.windows(2).all(|w| w[1] > w[0]), "{samples:?}");
}

#[test]
fn flow_around_block_conserves_mass() {
    let (nx, ny) = (64, 64);
    let mut obstacles = ObstacleMask::empty(nx, ny);
    for j in 28..36 {
        for i in 28..36 {
            obstacles.block(i, j);
        }
    }
    let mut sim = Simulation::new(params(nx, ny, 300, 0.005), obstacles).unwrap();
    let before = sim.distribution().total_density();

    sim.run();

    let after = sim.distribution().total_density();
    assert!((after - before).abs() < 1e-4 * before, "{before} -> {after}");
    assert!(sim.av_velocity() > 0.0);
    assert_eq!(sim.obstacles().fluid_count(), nx * ny - 64);
}

#[test]
fn block_turns_flow_apart_across_its_midline() {
    let (nx, ny) = (128, 128);
    let mut obstacles = ObstacleMask::empty(nx, ny);
    for j in 56..72 {
        for i in 56..72 {
            obstacles.block(i, j);
        }
    }
    let mut sim = Simulation::new(params(nx, ny, 2000, 0.005), obstacles).unwrap();
    let before = sim.distribution().total_density();

    sim.run();

    let grid = sim.distribution();
    let u_y = |i: usize, j: usize| Macroscopic::from_distributions(&grid.cell(grid.idx(i, j))).velocity.y;
    // just upstream of the block, flow is pushed up above the midline and down below it
    assert!(u_y(54, 68) > 0.0, "u_y(54, 68) = {}", u_y(54, 68));
    assert!(u_y(54, 59) < 0.0, "u_y(54, 59) = {}", u_y(54, 59));

    let after = grid.total_density();
    assert!((after - before).abs() < 1e-3 * before, "{before} -> {after}");
    assert_eq!(sim.av_vels().len(), 2000);
}

#[test]
fn all_obstacle_grid_is_unchanged() {
    let mut sim = Simulation::new(params(32, 32, 10, 0.0), ObstacleMask::full(32, 32)).unwrap();

    sim.run();

    let rest = D2Q9::rest_state(0.1);
    for idx in 0..sim.distribution().cells() {
        let cell = sim.distribution().cell(idx);
        for k in 0..D2Q9::Q {
            assert_abs_diff_eq!(cell[k], rest[k], epsilon = 1e-6);
        }
    }
    assert!(sim.av_vels().iter().all(|&u| u == 0.0));
}

#[test]
fn resting_fluid_stays_at_rest() {
    let mut sim = Simulation::new(params(64, 64, 100, 0.0), ObstacleMask::empty(64, 64)).unwrap();
    sim.run();
    assert_eq!(sim.av_vels().len(), 100);
    assert!(sim.av_vels().iter().all(|&u| u == 0.0));
}

#[test]
fn blocked_cell_in_accelerated_row_leaves_neighbours_driven() {
    let (nx, ny) = (8, 8);
    let mut obstacles = ObstacleMask::empty(nx, ny);
    obstacles.block(3, ny - 2);
    let mut sim = Simulation::new(params(nx, ny, 1, 0.005), obstacles).unwrap();

    // one step moves momentum at most one row away from the accelerated row
    sim.step();
    let grid = sim.distribution();
    let momentum = |i: usize, j: usize| {
        let f = grid.cell(grid.idx(i, j));
        f[1] + f[5] + f[8] - (f[3] + f[6] + f[7])
    };
    assert!(momentum(0, ny - 2) > 0.0);
    assert!(momentum(6, ny - 2) > 0.0);
    assert_eq!(momentum(3, 0), 0.0);
}

#[test]
fn reynolds_number_definition() {
    let p = params(32, 32, 50, 0.005);
    let omega = p.omega;
    let dim = p.reynolds_dim as f32;
    let mut sim = Simulation::new(p, ObstacleMask::empty(32, 32)).unwrap();
    sim.run();

    let expected = sim.av_velocity() * dim * 6.0 / (2.0 / omega - 1.0);
    assert_relative_eq!(sim.reynolds(), expected, max_relative = 1e-5);
    assert!(sim.reynolds() > 0.0);
}

#[test]
fn custom_initial_state_is_used() {
    let p = params(8, 8, 0, 0.0);
    let initial = Distribution::uniform(8, 8, 0.2);
    let sim = Simulation::with_initial_state(p, ObstacleMask::empty(8, 8), initial).unwrap();
    assert_abs_diff_eq!(sim.distribution().total_density(), 64.0 * 0.2, epsilon = 1e-4);
}

#[test]
fn loads_inputs_and_writes_results() {
    let dir = scratch_dir("roundtrip");
    let param_path = dir.join("input.params");
    let obstacle_path = dir.join("obstacles.dat");
    fs::write(&param_path, "16\n8\n5\n16\n0.1\n0.005\n1.7\n").unwrap();
    fs::write(&obstacle_path, "0 0 1\n15 7 1\n4 3 1\n").unwrap();

    let mut sim = Simulation::from_files(&param_path, &obstacle_path).unwrap();
    assert_eq!(sim.obstacles().obstacle_count(), 3);
    sim.run();
    ResultWriter::new(&dir).write_all(&sim).unwrap();

    let final_state = fs::read_to_string(dir.join("final_state.dat")).unwrap();
    let lines: Vec<&str> = final_state.lines().collect();
    assert_eq!(lines.len(), 16 * 8);
    let blocked = lines[4 + 3 * 16];
    assert!(blocked.starts_with("4 3 0.000000000000E+00"), "{blocked}");
    assert!(blocked.ends_with(" 1"));
    assert!(lines[1].ends_with(" 0"));

    let av_vels = fs::read_to_string(dir.join("av_vels.dat")).unwrap();
    assert_eq!(av_vels.lines().count(), 5);
    assert!(av_vels.starts_with("0:\t"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn zero_iterations_write_initial_state() {
    let dir = scratch_dir("zero-iters");
    let mut sim = Simulation::new(params(4, 4, 0, 0.005), ObstacleMask::empty(4, 4)).unwrap();
    sim.run();
    ResultWriter::new(&dir).write_all(&sim).unwrap();

    let av_vels = fs::read_to_string(dir.join("av_vels.dat")).unwrap();
    assert!(av_vels.is_empty());
    let final_state = fs::read_to_string(dir.join("final_state.dat")).unwrap();
    assert!(final_state.lines().all(|l| l.contains(" 0.000000000000E+00 0.000000000000E+00 0.000000000000E+00 ")));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_omega_is_reported() {
    let dir = scratch_dir("missing-omega");
    let param_path = dir.join("input.params");
    let obstacle_path = dir.join("obstacles.dat");
    fs::write(&param_path, "16\n16\n10\n16\n0.1\n0.005\n").unwrap();
    fs::write(&obstacle_path, "").unwrap();

    let err = Simulation::from_files(&param_path, &obstacle_path).err().unwrap();
    assert!(format!("{err:#}").contains("omega"), "{err:#}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_obstacle_file_is_reported() {
    let dir = scratch_dir("missing-obstacles");
    let param_path = dir.join("input.params");
    fs::write(&param_path, "16\n16\n10\n16\n0.1\n0.005\n1.7\n").unwrap();

    let err = Simulation::from_files(&param_path, dir.join("nope.dat")).err().unwrap();
    assert!(format!("{err:#}").contains("could not open input obstacles file"), "{err:#}");

    fs::remove_dir_all(&dir).ok();
}
