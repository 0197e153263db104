use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use std::ops::{Deref, DerefMut};
use crate::lattice::D2Q9;
use crate::Float;

/// Alignment of every direction field, in bytes.
pub const ALIGNMENT: usize = 64;

const LANES: usize = ALIGNMENT / std::mem::size_of::<Float>();

/// One cache line worth of densities.
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy)]
struct Block([Float; LANES]);

// SAFETY: `Block` is `repr(C)` around a plain float array whose size equals
// its alignment, so it has no padding and every bit pattern is valid.
unsafe impl Zeroable for Block {}
unsafe impl Pod for Block {}

/// Contiguous storage for one direction, aligned to [`ALIGNMENT`] bytes.
#[derive(Debug, Clone)]
pub struct AlignedField {
    blocks: Vec<Block>,
    len: usize,
}

impl AlignedField {
    pub fn zeroed(len: usize) -> Self {
        Self {
            blocks: vec![Block::zeroed(); len.div_ceil(LANES)],
            len,
        }
    }

    pub fn filled(len: usize, value: Float) -> Self {
        let mut field = Self::zeroed(len);
        field.fill(value);
        field
    }

    pub fn as_slice(&self) -> &[Float] {
        &bytemuck::cast_slice::<Block, Float>(&self.blocks)[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [Float] {
        &mut bytemuck::cast_slice_mut::<Block, Float>(&mut self.blocks)[..self.len]
    }
}

impl Deref for AlignedField {
    type Target = [Float];

    fn deref(&self) -> &[Float] {
        self.as_slice()
    }
}

impl DerefMut for AlignedField {
    fn deref_mut(&mut self) -> &mut [Float] {
        self.as_mut_slice()
    }
}

/// Nine-direction distribution over an `nx * ny` row-major grid, stored as
/// structure-of-arrays: `field(k)[i + j * nx]`.
#[derive(Debug, Clone)]
pub struct Distribution {
    nx: usize,
    ny: usize,
    fields: [AlignedField; D2Q9::Q],
}

impl Distribution {
    pub fn zeroed(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            fields: std::array::from_fn(|_| AlignedField::zeroed(nx * ny)),
        }
    }

    /// Every cell at the rest equilibrium for `density`.
    pub fn uniform(nx: usize, ny: usize, density: Float) -> Self {
        let rest = D2Q9::rest_state(density);
        Self {
            nx,
            ny,
            fields: std::array::from_fn(|k| AlignedField::filled(nx * ny, rest[k])),
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn cells(&self) -> usize {
        self.nx * self.ny
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i + j * self.nx
    }

    pub fn field(&self, k: usize) -> &[Float] {
        &self.fields[k]
    }

    pub fn field_mut(&mut self, k: usize) -> &mut [Float] {
        &mut self.fields[k]
    }

    pub fn fields(&self) -> [&[Float]; D2Q9::Q] {
        self.fields.each_ref().map(AlignedField::as_slice)
    }

    pub fn fields_mut(&mut self) -> [&mut [Float]; D2Q9::Q] {
        self.fields.each_mut().map(AlignedField::as_mut_slice)
    }

    /// All nine densities of one cell.
    pub fn cell(&self, idx: usize) -> [Float; D2Q9::Q] {
        std::array::from_fn(|k| self.fields[k][idx])
    }

    pub fn set_cell(&mut self, idx: usize, values: [Float; D2Q9::Q]) {
        for (field, value) in self.fields.iter_mut().zip(values) {
            field[idx] = value;
        }
    }

    /// Sum of every distribution over the grid.
    pub fn total_density(&self) -> f64 {
        self.fields
            .iter()
            .map(|field| field.iter().map(|&f| f as f64).sum::<f64>())
            .sum()
    }

    /// Parallel iterator over disjoint rows of all nine fields; item `j`
    /// holds row `j` of every direction. Borrows the fields in place.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = [&mut [Float]; D2Q9::Q]> {
        let nx = self.nx;
        let [f0, f1, f2, f3, f4, f5, f6, f7, f8] = self.fields_mut();
        (
            f0.par_chunks_mut(nx),
            f1.par_chunks_mut(nx),
            f2.par_chunks_mut(nx),
            f3.par_chunks_mut(nx),
            f4.par_chunks_mut(nx),
            f5.par_chunks_mut(nx),
            f6.par_chunks_mut(nx),
            f7.par_chunks_mut(nx),
            f8.par_chunks_mut(nx),
        )
            .into_par_iter()
            .map(|(g0, g1, g2, g3, g4, g5, g6, g7, g8)| [g0, g1, g2, g3, g4, g5, g6, g7, g8])
    }
}
