use nalgebra::Vector2;
use crate::Float;

/// D2Q9 lattice model constants.
///
/// Directions are numbered
/// ```text
///   6   2   5
///    \  |  /
///   3 - 0 - 1
///    /  |  \
///   7   4   8
/// ```
pub struct D2Q9;

impl D2Q9 {
    /// Number of discrete velocities
    pub const Q: usize = 9;

    /// Discrete velocities (dx, dy)
    pub const VELOCITIES: [[i32; 2]; 9] = [
        [0, 0],
        [1, 0], [0, 1], [-1, 0], [0, -1],
        [1, 1], [-1, 1], [-1, -1], [1, -1],
    ];

    /// Weight of the rest direction
    pub const W0: Float = 4.0 / 9.0;
    /// Weight of the axis directions
    pub const W1: Float = 1.0 / 9.0;
    /// Weight of the diagonal directions
    pub const W2: Float = 1.0 / 36.0;

    pub const WEIGHTS: [Float; 9] = [
        Self::W0,
        Self::W1, Self::W1, Self::W1, Self::W1,
        Self::W2, Self::W2, Self::W2, Self::W2,
    ];

    /// Opposite directions for bounce-back
    pub const OPPOSITE: [usize; 9] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

    /// Speed of sound squared
    pub const CS2: Float = 1.0 / 3.0;

    /// Equilibrium distribution for one direction.
    #[inline]
    pub fn equilibrium(direction: usize, density: Float, velocity: [Float; 2]) -> Float {
        let c = Self::VELOCITIES[direction];
        let cu = c[0] as Float * velocity[0] + c[1] as Float * velocity[1];
        let u2 = velocity[0] * velocity[0] + velocity[1] * velocity[1];

        Self::WEIGHTS[direction]
            * density
            * (1.0 + cu / Self::CS2 + cu * cu / (2.0 * Self::CS2 * Self::CS2)
                - u2 / (2.0 * Self::CS2))
    }

    /// Equilibrium distributions at rest with the given density.
    pub fn rest_state(density: Float) -> [Float; 9] {
        Self::WEIGHTS.map(|w| w * density)
    }
}

/// Macroscopic moments of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macroscopic {
    pub density: Float,
    pub velocity: Vector2<Float>,
}

impl Macroscopic {
    pub fn from_distributions(f: &[Float; 9]) -> Self {
        let density = f.iter().sum::<Float>();
        let u_x = (f[1] + f[5] + f[8] - (f[3] + f[6] + f[7])) / density;
        let u_y = (f[2] + f[5] + f[6] - (f[4] + f[7] + f[8])) / density;

        Self {
            density,
            velocity: Vector2::new(u_x, u_y),
        }
    }

    pub fn speed(&self) -> Float {
        self.velocity.norm()
    }

    pub fn pressure(&self) -> Float {
        self.density * D2Q9::CS2
    }
}
