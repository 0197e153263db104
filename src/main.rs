use d2q9_bgk::{ResultWriter, Simulation};
use anyhow::Result;
use log::info;
use std::env;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let exe = args.first().map(String::as_str).unwrap_or("d2q9-bgk");
        eprintln!("Usage: {} <paramfile> <obstaclefile>", exe);
        std::process::exit(1);
    }

    let param_path = &args[1];
    let obstacle_path = &args[2];

    info!("Loading parameters from {} and obstacles from {}", param_path, obstacle_path);
    let mut simulation = Simulation::from_files(param_path, obstacle_path)?;

    simulation.run();

    let collate_started = Instant::now();
    let reynolds = simulation.reynolds();
    simulation.record_collate(collate_started.elapsed());

    let timings = simulation.timings();
    println!("==done==");
    println!("Reynolds number:\t\t{}", d2q9_bgk::output::sci(reynolds));
    println!("Elapsed Init time:\t\t\t{:.6} (s)", timings.init.as_secs_f64());
    println!("Elapsed Compute time:\t\t\t{:.6} (s)", timings.compute.as_secs_f64());
    println!("Elapsed Collate time:\t\t\t{:.6} (s)", timings.collate.as_secs_f64());
    println!("Elapsed Total time:\t\t\t{:.6} (s)", timings.total().as_secs_f64());

    ResultWriter::new(".").write_all(&simulation)?;

    Ok(())
}
