use anyhow::Result;
use d2q9_bgk::Params;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Write a parameter file in the plain-text format.
pub fn generate_params(filename: &str, params: &Params) -> Result<()> {
    let mut file = File::create(filename)?;

    writeln!(file, "{}", params.nx)?;
    writeln!(file, "{}", params.ny)?;
    writeln!(file, "{}", params.max_iters)?;
    writeln!(file, "{}", params.reynolds_dim)?;
    writeln!(file, "{}", params.density)?;
    writeln!(file, "{}", params.accel)?;
    writeln!(file, "{}", params.omega)?;

    Ok(())
}

/// Write an obstacle file holding a `size x size` block centred in the domain.
pub fn generate_block_obstacles(filename: &str, nx: usize, ny: usize, size: usize) -> Result<usize> {
    let mut file = BufWriter::new(File::create(filename)?);

    let x0 = nx.saturating_sub(size) / 2;
    let y0 = ny.saturating_sub(size) / 2;
    let mut count = 0;

    for y in y0..(y0 + size).min(ny) {
        for x in x0..(x0 + size).min(nx) {
            writeln!(file, "{} {} 1", x, y)?;
            count += 1;
        }
    }
    file.flush()?;

    Ok(count)
}

fn main() -> Result<()> {
    let params = Params {
        nx: 128,
        ny: 128,
        max_iters: 2000,
        reynolds_dim: 128,
        density: 0.1,
        accel: 0.005,
        omega: 1.7,
    };
    params.validate()?;

    generate_params("input_128x128.params", &params)?;
    println!("Generated input_128x128.params");

    let count = generate_block_obstacles("obstacles_128x128.dat", params.nx, params.ny, 16)?;
    println!("Generated obstacles_128x128.dat with {} blocked cells", count);

    println!("Run with: cargo run --release -- input_128x128.params obstacles_128x128.dat");

    Ok(())
}
