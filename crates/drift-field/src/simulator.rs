//! The flow-field simulator and its frame loop.

use std::time::{Duration, Instant};

use drift_core::{ColorTheme, FlowSettings, FlowSpeed};
use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::clock::{Debouncer, FrameClock, FrameRequest};
use crate::noise::NoiseField;
use crate::particle::{Bounds, Particle, StepContext};
use crate::pool::ParticlePool;
use crate::surface::Surface;

/// Viewport size in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Options sampled once when the simulator is launched.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub settings: FlowSettings,
    pub theme: ColorTheme,
    pub speed: FlowSpeed,
    /// The user prefers reduced motion; the simulator never starts.
    pub reduce_motion: bool,
    /// Fixed RNG seed, random when `None`.
    pub seed: Option<u64>,
}

/// Owns the noise field, the particle pool, the tick and the surface.
#[derive(Debug)]
pub struct Simulator<S> {
    surface: S,
    settings: FlowSettings,
    theme: ColorTheme,
    speed: FlowSpeed,
    field: NoiseField,
    pool: ParticlePool,
    bounds: Bounds,
    tick: u64,
    /// The one outstanding frame callback, if the loop is running.
    pending: Option<FrameRequest>,
    resize: Debouncer<Viewport>,
    rng: StdRng,
}

impl<S: Surface> Simulator<S> {
    /// Build a simulator, or decline when there is nothing to draw on or the
    /// user prefers reduced motion.
    pub fn launch(surface: Option<S>, options: LaunchOptions) -> Option<Self> {
        if options.reduce_motion {
            debug!("reduced motion requested, not starting");
            return None;
        }
        let Some(surface) = surface else {
            debug!("no drawing surface, not starting");
            return None;
        };

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let settings = options.settings.sanitized();
        let field = NoiseField::new(&mut rng);
        let (width, height) = surface.size();
        let bounds = Bounds::new(width, height);
        let pool = ParticlePool::with_count(
            settings.target_count(width),
            bounds,
            settings.trail_length,
            &mut rng,
        );
        let resize = Debouncer::new(Duration::from_millis(settings.resize_debounce_ms));

        debug!(width, height, particles = pool.len(), "simulator launched");

        let mut simulator = Self {
            surface,
            settings,
            theme: options.theme,
            speed: options.speed,
            field,
            pool,
            bounds,
            tick: 0,
            pending: None,
            resize,
            rng,
        };
        simulator.clear();
        Some(simulator)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.as_slice()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn theme(&self) -> ColorTheme {
        self.theme
    }

    /// Switch themes. The surface is repainted with the new background.
    pub fn set_theme(&mut self, theme: ColorTheme) {
        if self.theme != theme {
            self.theme = theme;
            self.clear();
        }
    }

    pub fn speed(&self) -> FlowSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: FlowSpeed) {
        self.speed = speed;
    }

    /// Whether a frame callback is outstanding.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedule the first frame. No-op if the loop is already running.
    pub fn start<C: FrameClock + ?Sized>(&mut self, clock: &mut C) {
        if self.pending.is_none() {
            self.pending = Some(clock.request_frame());
            debug!(tick = self.tick, "frame loop started");
        }
    }

    /// Cancel the outstanding frame, if any.
    pub fn stop<C: FrameClock + ?Sized>(&mut self, clock: &mut C) {
        if let Some(request) = self.pending.take() {
            clock.cancel_frame(request);
            debug!(tick = self.tick, "frame loop stopped");
        }
    }

    /// Hidden surfaces stop the loop; showing restarts it with a fresh frame.
    pub fn set_visible<C: FrameClock + ?Sized>(&mut self, visible: bool, clock: &mut C) {
        if visible {
            self.start(clock);
        } else {
            self.stop(clock);
        }
    }

    /// Frame callback. Runs one step and schedules the next frame.
    ///
    /// Returns `false` and does nothing for a request that is not the
    /// outstanding one.
    pub fn on_frame<C: FrameClock + ?Sized>(&mut self, request: FrameRequest, clock: &mut C) -> bool {
        if self.pending != Some(request) {
            return false;
        }
        self.pending = None;
        self.step();
        self.pending = Some(clock.request_frame());
        true
    }

    /// Paint the whole surface with the theme background.
    fn clear(&mut self) {
        let (width, height) = self.surface.size();
        self.surface
            .fill_rect(0, 0, width, height, self.theme.background(), 1.0);
    }

    /// Advance the simulation by one frame and paint it.
    pub fn step(&mut self) {
        let (width, height) = self.surface.size();
        self.surface.fill_rect(
            0,
            0,
            width,
            height,
            self.theme.background(),
            self.settings.fade_alpha,
        );

        let ctx = StepContext {
            field: &self.field,
            settings: &self.settings,
            bounds: self.bounds,
            tick: self.tick,
            speed: self.settings.speed * self.speed.multiplier(),
        };
        let color = self.theme.stroke();
        for particle in self.pool.iter_mut() {
            particle.update(&ctx, &mut self.rng);
            particle.draw(&mut self.surface, color, self.settings.base_alpha);
        }

        self.tick += 1;
    }

    /// Record a viewport change. Applied by [`Self::poll_resize`] once the
    /// burst settles.
    pub fn on_resize(&mut self, viewport: Viewport, now: Instant) {
        self.resize.schedule(now, viewport);
    }

    /// Time left before a pending resize is applied.
    pub fn resize_due_in(&self, now: Instant) -> Option<Duration> {
        self.resize.time_until_due(now)
    }

    /// Apply the last resize of a settled burst. Returns whether one was applied.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(viewport) => {
                self.apply_resize(viewport);
                true
            }
            None => false,
        }
    }

    /// Resize the surface and grow or truncate the pool to the new target.
    pub fn apply_resize(&mut self, viewport: Viewport) {
        self.surface.resize(viewport.width, viewport.height);
        self.clear();
        self.bounds = Bounds::new(viewport.width, viewport.height);
        let target = self.settings.target_count(viewport.width);
        self.pool.resize_to(
            target,
            self.bounds,
            self.settings.trail_length,
            &mut self.rng,
        );
        debug!(
            width = viewport.width,
            height = viewport.height,
            particles = self.pool.len(),
            "resize applied"
        );
    }
}
