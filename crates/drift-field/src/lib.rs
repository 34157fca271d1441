//! Noise-driven particle flow field.
//!
//! A fixed pool of particles is pushed around by a slowly drifting value-noise
//! field. Each frame fades the previous one and strokes every particle's
//! recent trail, so motion leaves soft streaks behind it. The simulator
//! draws onto any [`Surface`] and schedules itself through a [`FrameClock`];
//! [`render_canvas`] shows a [`Canvas`] in a ratatui frame.

mod clock;
mod noise;
mod particle;
mod pool;
mod simulator;
mod surface;
mod view;

pub use clock::{Debouncer, FrameClock, FrameRequest, IntervalClock};
pub use noise::NoiseField;
pub use particle::{Bounds, LIFE_RANGE, Particle, StepContext, flow_angle};
pub use pool::ParticlePool;
pub use simulator::{LaunchOptions, Simulator, Viewport};
pub use surface::{Canvas, Surface};
pub use view::{canvas_size, render_canvas};
