//! Contiguous particle storage.

use rand::Rng;

use crate::particle::{Bounds, Particle};

/// Ordered particle slots. Particles are reset in place, never reallocated.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    /// Fill a pool with `count` freshly spawned particles.
    pub fn with_count<R: Rng + ?Sized>(
        count: usize,
        bounds: Bounds,
        trail_length: usize,
        rng: &mut R,
    ) -> Self {
        let mut pool = Self::default();
        pool.resize_to(count, bounds, trail_length, rng);
        pool
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    /// Grow by spawning new particles at the tail, or truncate the tail.
    ///
    /// Surviving particles keep their state.
    pub fn resize_to<R: Rng + ?Sized>(
        &mut self,
        target: usize,
        bounds: Bounds,
        trail_length: usize,
        rng: &mut R,
    ) {
        if target <= self.particles.len() {
            self.particles.truncate(target);
            return;
        }
        self.particles.reserve(target - self.particles.len());
        while self.particles.len() < target {
            self.particles.push(Particle::spawn(bounds, trail_length, rng));
        }
    }
}
