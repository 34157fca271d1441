//! Value noise over three dimensions.
//!
//! Each lattice corner carries a single random scalar; samples are the
//! trilinear blend of the eight surrounding corners, smoothed with the
//! quintic fade curve. The field repeats every 256 units along each axis.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

const TABLE_SIZE: usize = 256;
const MASK: i64 = TABLE_SIZE as i64 - 1;

/// Immutable permutation and gradient tables.
#[derive(Debug, Clone)]
pub struct NoiseField {
    /// Shuffled 0..256, repeated once so `perm[i + 1]` never needs wrapping.
    perm: [u8; TABLE_SIZE * 2],
    /// One scalar per lattice hash, uniform in [-1, 1].
    grad: [f64; TABLE_SIZE],
}

impl NoiseField {
    /// Build the tables from `rng`.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut base: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);
        base.shuffle(rng);

        let perm = std::array::from_fn(|i| base[i & (TABLE_SIZE - 1)]);
        let grad = std::array::from_fn(|_| rng.gen_range(-1.0..=1.0));

        Self { perm, grad }
    }

    /// Build a reproducible field from a seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(&mut StdRng::seed_from_u64(seed))
    }

    /// Smallest and largest gradient value; every sample lies between them.
    pub fn gradient_range(&self) -> (f64, f64) {
        self.grad
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &g| {
                (lo.min(g), hi.max(g))
            })
    }

    /// Sample the field at `(x, y, z)`. Result is roughly in [-1, 1].
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = split(x);
        let (yi, yf) = split(y);
        let (zi, zf) = split(z);

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let p = |i: usize| self.perm[i] as usize;
        let a = p(xi) + yi;
        let aa = p(a) + zi;
        let ab = p(a + 1) + zi;
        let b = p(xi + 1) + yi;
        let ba = p(b) + zi;
        let bb = p(b + 1) + zi;

        let g = |i: usize| self.grad[p(i)];

        lerp(
            w,
            lerp(
                v,
                lerp(u, g(aa), g(ba)),
                lerp(u, g(ab), g(bb)),
            ),
            lerp(
                v,
                lerp(u, g(aa + 1), g(ba + 1)),
                lerp(u, g(ab + 1), g(bb + 1)),
            ),
        )
    }
}

/// Split a coordinate into its masked lattice cell and fractional offset.
fn split(c: f64) -> (usize, f64) {
    let floor = c.floor();
    ((floor as i64 & MASK) as usize, c - floor)
}

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}
