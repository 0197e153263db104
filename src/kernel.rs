//! Per-timestep work on the distribution field: the acceleration stage and the
//! fused streaming, bounce-back, BGK collision and velocity reduction pass.

use rayon::prelude::*;
use crate::{
    config::Params,
    geometry::ObstacleMask,
    grid::Distribution,
    lattice::D2Q9,
    Float,
};

/// Push density from west-moving to east-moving directions along the
/// accelerated row. Cells that are solid, or would be left with a
/// non-positive density in any decreased direction, are skipped.
pub fn accelerate_flow(params: &Params, obstacles: &ObstacleMask, grid: &mut Distribution) {
    let w1 = params.density * params.accel / 9.0;
    let w2 = params.density * params.accel / 36.0;

    let nx = grid.nx();
    let row = params.accelerated_row() * nx;
    let [_, f1, _, f3, _, f5, f6, f7, f8] = grid.fields_mut();

    for idx in row..row + nx {
        if !obstacles.is_obstacle(idx)
            && f3[idx] - w1 > 0.0
            && f6[idx] - w2 > 0.0
            && f7[idx] - w2 > 0.0
        {
            // east-side
            f1[idx] += w1;
            f5[idx] += w2;
            f8[idx] += w2;
            // west-side
            f3[idx] -= w1;
            f6[idx] -= w2;
            f7[idx] -= w2;
        }
    }
}

/// Advance one timestep from `current` into `scratch` and return the average
/// velocity magnitude over fluid cells.
///
/// Rows are processed in parallel; every row of `scratch` is written exactly
/// once and `current` is only read.
pub fn fused_step(
    params: &Params,
    obstacles: &ObstacleMask,
    current: &Distribution,
    scratch: &mut Distribution,
) -> Float {
    let nx = current.nx();
    let ny = current.ny();
    let omega = params.omega;
    let src = current.fields();
    let solid = obstacles.as_slice();

    let (tot_u, tot_cells) = scratch
        .par_rows_mut()
        .enumerate()
        .map(|(j, dst)| stream_collide_row(j, nx, ny, omega, &src, solid, dst))
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    mean_speed(tot_u, tot_cells)
}

/// Average velocity magnitude over the fluid cells of `grid`, without
/// advancing it.
pub fn av_velocity(obstacles: &ObstacleMask, grid: &Distribution) -> Float {
    let (tot_u, tot_cells) = (0..grid.cells())
        .into_par_iter()
        .filter(|&idx| !obstacles.is_obstacle(idx))
        .map(|idx| {
            let (u_x, u_y) = velocity(&grid.cell(idx));
            ((u_x * u_x + u_y * u_y).sqrt(), 1usize)
        })
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    mean_speed(tot_u, tot_cells)
}

fn mean_speed(tot_u: Float, tot_cells: usize) -> Float {
    if tot_cells == 0 {
        0.0
    } else {
        tot_u / tot_cells as Float
    }
}

fn stream_collide_row(
    j: usize,
    nx: usize,
    ny: usize,
    omega: Float,
    src: &[&[Float]; D2Q9::Q],
    solid: &[bool],
    mut dst: [&mut [Float]; D2Q9::Q],
) -> (Float, usize) {
    let [f0, f1, f2, f3, f4, f5, f6, f7, f8] = *src;
    let y_n = (j + 1) % ny;
    let y_s = (j + ny - 1) % ny;

    let row = j * nx;
    let row_n = y_n * nx;
    let row_s = y_s * nx;

    let mut tot_u: Float = 0.0;
    let mut tot_cells = 0usize;

    for i in 0..nx {
        let x_e = (i + 1) % nx;
        let x_w = (i + nx - 1) % nx;

        // pull from the upstream neighbour of each direction
        let t = [
            f0[row + i],
            f1[row + x_w],
            f2[row_s + i],
            f3[row + x_e],
            f4[row_n + i],
            f5[row_s + x_w],
            f6[row_s + x_e],
            f7[row_n + x_e],
            f8[row_n + x_w],
        ];

        let g = if solid[row + i] {
            D2Q9::OPPOSITE.map(|k| t[k])
        } else {
            let (g, speed) = collide(&t, omega);
            tot_u += speed;
            tot_cells += 1;
            g
        };

        for (field, value) in dst.iter_mut().zip(g) {
            field[i] = value;
        }
    }

    (tot_u, tot_cells)
}

#[inline]
fn velocity(t: &[Float; D2Q9::Q]) -> (Float, Float) {
    let density: Float = t.iter().sum();
    let u_x = (t[1] + t[5] + t[8] - (t[3] + t[6] + t[7])) / density;
    let u_y = (t[2] + t[5] + t[6] - (t[4] + t[7] + t[8])) / density;
    (u_x, u_y)
}

/// BGK relaxation of one post-stream cell. Returns the relaxed densities and
/// the cell's velocity magnitude.
#[inline]
fn collide(t: &[Float; D2Q9::Q], omega: Float) -> ([Float; D2Q9::Q], Float) {
    const C_SQ: Float = D2Q9::CS2;

    let density: Float = t.iter().sum();
    let u_x = (t[1] + t[5] + t[8] - (t[3] + t[6] + t[7])) / density;
    let u_y = (t[2] + t[5] + t[6] - (t[4] + t[7] + t[8])) / density;
    let u_sq = u_x * u_x + u_y * u_y;

    let u = [
        0.0,
        u_x,
        u_y,
        -u_x,
        -u_y,
        u_x + u_y,
        -u_x + u_y,
        -u_x - u_y,
        u_x - u_y,
    ];

    let g = std::array::from_fn(|k| {
        let d_equ = D2Q9::WEIGHTS[k]
            * density
            * (1.0 + u[k] / C_SQ + (u[k] * u[k]) / (2.0 * C_SQ * C_SQ) - u_sq / (2.0 * C_SQ));
        t[k] + omega * (d_equ - t[k])
    });

    (g, u_sq.sqrt())
}
