//! Flow-field particles (stateful).

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::ops::Range;

use drift_core::{FlowSettings, Rgb};
use rand::Rng;

use crate::noise::NoiseField;
use crate::surface::Surface;

/// Life, in frames, a particle is spawned with.
pub const LIFE_RANGE: Range<u32> = 100..300;

/// Canvas extent particles live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    /// Whether `(x, y)` lies in `[0, width) × [0, height)`.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x < self.width && y >= 0.0 && y < self.height
    }
}

/// Everything a particle reads during one update.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub field: &'a NoiseField,
    pub settings: &'a FlowSettings,
    pub bounds: Bounds,
    /// Current simulation tick.
    pub tick: u64,
    /// Integration speed, already scaled by the playback speed.
    pub speed: f32,
}

/// A single particle pushed around by the flow field.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Recent positions, oldest first.
    trail: VecDeque<(f32, f32)>,
    /// Frames left to live, in `(0, max_life]`.
    life: u32,
    max_life: u32,
}

impl Particle {
    /// Spawn a particle at a random point within `bounds`.
    pub fn spawn<R: Rng + ?Sized>(bounds: Bounds, trail_length: usize, rng: &mut R) -> Self {
        let mut particle = Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            trail: VecDeque::with_capacity(trail_length + 1),
            life: 1,
            max_life: 1,
        };
        particle.reset(bounds, rng);
        particle
    }

    pub fn trail(&self) -> &VecDeque<(f32, f32)> {
        &self.trail
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn max_life(&self) -> u32 {
        self.max_life
    }

    /// Remaining life as a fraction of the spawn life.
    pub fn life_fraction(&self) -> f32 {
        self.life as f32 / self.max_life.max(1) as f32
    }

    /// Respawn in place: new position and life, no velocity, empty trail.
    pub fn reset<R: Rng + ?Sized>(&mut self, bounds: Bounds, rng: &mut R) {
        self.x = random_below(rng, bounds.width);
        self.y = random_below(rng, bounds.height);
        self.vx = 0.0;
        self.vy = 0.0;
        self.trail.clear();
        self.life = rng.gen_range(LIFE_RANGE);
        self.max_life = self.life;
    }

    /// Advance one frame.
    pub fn update<R: Rng + ?Sized>(&mut self, ctx: &StepContext<'_>, rng: &mut R) {
        let settings = ctx.settings;

        self.trail.push_back((self.x, self.y));
        while self.trail.len() > settings.trail_length {
            self.trail.pop_front();
        }

        let n = ctx.field.sample(
            self.x as f64 * settings.noise_scale,
            self.y as f64 * settings.noise_scale,
            ctx.tick as f64 * settings.time_scale,
        );
        let angle = flow_angle(n);

        self.vx += angle.cos() * settings.force;
        self.vy += angle.sin() * settings.force;
        self.vx *= settings.damping;
        self.vy *= settings.damping;

        self.x += self.vx * ctx.speed;
        self.y += self.vy * ctx.speed;

        self.life = self.life.saturating_sub(1);

        // Bounds are checked against the integrated position
        if self.life == 0 || !ctx.bounds.contains(self.x, self.y) {
            self.reset(ctx.bounds, rng);
        }
    }

    /// Stroke the trail, fading out as the particle ages.
    pub fn draw<S: Surface>(&self, surface: &mut S, color: Rgb, base_alpha: f32) {
        if self.trail.len() < 2 {
            return;
        }
        let alpha = self.life_fraction() * base_alpha;
        let head = std::iter::once((self.x, self.y));
        surface.stroke_polyline(self.trail.iter().copied().chain(head), color, alpha);
    }
}

/// Map a noise value in [-1, 1] to a direction in [0, 4π).
pub fn flow_angle(n: f64) -> f32 {
    let angle = (n.clamp(-1.0, 1.0) + 1.0) * TAU;
    (angle % (2.0 * TAU)) as f32
}

/// Uniform sample in `[0, max)`, or 0 when the range is empty.
fn random_below<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    /// Records the strokes it receives.
    #[derive(Default)]
    struct RecordingSurface {
        strokes: Vec<(Vec<(f32, f32)>, f32)>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (100, 100)
        }

        fn resize(&mut self, _width: u32, _height: u32) {}

        fn fill_rect(&mut self, _x: u32, _y: u32, _w: u32, _h: u32, _color: Rgb, _alpha: f32) {}

        fn stroke_polyline<I>(&mut self, points: I, _color: Rgb, alpha: f32)
        where
            I: IntoIterator<Item = (f32, f32)>,
        {
            self.strokes.push((points.into_iter().collect(), alpha));
        }
    }

    fn ctx<'a>(field: &'a NoiseField, settings: &'a FlowSettings, bounds: Bounds) -> StepContext<'a> {
        StepContext {
            field,
            settings,
            bounds,
            tick: 0,
            speed: settings.speed,
        }
    }

    #[test]
    fn test_reset_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let bounds = Bounds::new(100, 40);
        let mut p = Particle::spawn(bounds, 10, &mut rng);
        for _ in 0..1_000 {
            p.vx = 3.0;
            p.reset(bounds, &mut rng);
            assert!(bounds.contains(p.x, p.y));
            assert!(LIFE_RANGE.contains(&p.life()));
            assert_eq!(p.life(), p.max_life());
            assert_eq!(p.vx, 0.0);
            assert!(p.trail().is_empty());
        }
    }

    #[test]
    fn test_trail_never_exceeds_max() {
        let mut rng = StdRng::seed_from_u64(2);
        let field = NoiseField::seeded(2);
        let settings = FlowSettings {
            trail_length: 8,
            ..Default::default()
        };
        let bounds = Bounds::new(60, 30);
        let mut p = Particle::spawn(bounds, settings.trail_length, &mut rng);
        let mut ctx = ctx(&field, &settings, bounds);
        for tick in 0..2_000 {
            ctx.tick = tick;
            p.update(&ctx, &mut rng);
            assert!(p.trail().len() <= 8);
        }
    }

    #[test]
    fn test_life_decrements_by_one_until_reset() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = NoiseField::seeded(3);
        let settings = FlowSettings::default();
        let bounds = Bounds::new(10_000, 10_000);
        let mut p = Particle::spawn(bounds, settings.trail_length, &mut rng);
        p.x = 5_000.0;
        p.y = 5_000.0;
        p.life = 5;
        p.max_life = 5;

        let ctx = ctx(&field, &settings, bounds);
        for expected in (1..5).rev() {
            p.update(&ctx, &mut rng);
            assert_eq!(p.life(), expected);
        }
        // Fifth update drains life and respawns
        p.update(&ctx, &mut rng);
        assert!(LIFE_RANGE.contains(&p.life()));
        assert!(p.trail().is_empty());
    }

    #[test]
    fn test_leaving_bounds_resets_same_update() {
        let mut rng = StdRng::seed_from_u64(4);
        let field = NoiseField::seeded(4);
        let settings = FlowSettings::default();
        let bounds = Bounds::new(100, 100);
        let mut p = Particle::spawn(bounds, settings.trail_length, &mut rng);
        p.x = 99.0;
        p.y = 50.0;
        p.vx = 100.0;
        p.vy = 0.0;
        p.life = 250;
        p.max_life = 250;

        // Pre-integration position is inside; integration lands past x = 150
        assert!(bounds.contains(p.x, p.y));
        p.update(&ctx(&field, &settings, bounds), &mut rng);

        assert!(bounds.contains(p.x, p.y));
        assert!(p.trail().is_empty());
        assert_eq!(p.vx, 0.0);
        assert!(LIFE_RANGE.contains(&p.life()));
    }

    #[test]
    fn test_velocity_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(5);
        let field = NoiseField::seeded(5);
        let settings = FlowSettings::default();
        let bounds = Bounds::new(500, 500);
        let mut p = Particle::spawn(bounds, settings.trail_length, &mut rng);
        let limit = settings.force / (1.0 - settings.damping) + 1e-3;
        let mut c = ctx(&field, &settings, bounds);
        for tick in 0..5_000 {
            c.tick = tick;
            p.update(&c, &mut rng);
            assert!(p.vx.abs() <= limit && p.vy.abs() <= limit);
        }
    }

    #[test]
    fn test_flow_angle_range() {
        assert_eq!(flow_angle(-1.0), 0.0);
        assert!((flow_angle(0.0) - std::f32::consts::TAU).abs() < 1e-6);
        for i in -100..=100 {
            let a = flow_angle(i as f64 / 100.0);
            assert!((0.0..(2.0 * std::f32::consts::TAU)).contains(&a));
        }
    }

    #[test]
    fn test_draw_needs_two_trail_points() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut surface = RecordingSurface::default();
        let mut p = Particle::spawn(Bounds::new(100, 100), 10, &mut rng);

        p.draw(&mut surface, Rgb::BLACK, 0.5);
        p.trail.push_back((1.0, 1.0));
        p.draw(&mut surface, Rgb::BLACK, 0.5);
        assert!(surface.strokes.is_empty());

        p.trail.push_back((2.0, 2.0));
        p.draw(&mut surface, Rgb::BLACK, 0.5);
        assert_eq!(surface.strokes.len(), 1);
        // Trail plus the current head
        assert_eq!(surface.strokes[0].0.len(), 3);
        assert_eq!(surface.strokes[0].0[2], (p.x, p.y));
    }

    #[test]
    fn test_draw_alpha_fades_with_life() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut surface = RecordingSurface::default();
        let mut p = Particle::spawn(Bounds::new(100, 100), 10, &mut rng);
        p.trail.extend([(1.0, 1.0), (2.0, 2.0)]);
        p.max_life = 200;
        p.life = 50;

        p.draw(&mut surface, Rgb::BLACK, 0.8);
        assert!((surface.strokes[0].1 - 0.2).abs() < 1e-6);
    }
}
