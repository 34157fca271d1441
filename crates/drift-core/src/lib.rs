//! Core types shared across the drift crates.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blend `other` over `self` with the given opacity (0.0-1.0).
    pub fn blend(self, other: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |dst: u8, src: u8| -> u8 {
            let v = dst as f32 + (src as f32 - dst as f32) * a;
            let out = v.round().clamp(0.0, 255.0) as u8;
            // Any alpha above zero moves a differing channel by at least one level
            if out == dst && a > 0.0 {
                match src.cmp(&dst) {
                    std::cmp::Ordering::Greater => dst + 1,
                    std::cmp::Ordering::Less => dst - 1,
                    std::cmp::Ordering::Equal => dst,
                }
            } else {
                out
            }
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// Color theme for the flow field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Ocean,
    Aurora,
    Ember,
    Mono,
}

impl ColorTheme {
    /// Color particle trails are stroked with.
    pub fn stroke(&self) -> Rgb {
        match self {
            ColorTheme::Ocean => Rgb::new(100, 150, 255),
            ColorTheme::Aurora => Rgb::new(80, 230, 160),
            ColorTheme::Ember => Rgb::new(255, 140, 60),
            ColorTheme::Mono => Rgb::new(220, 220, 220),
        }
    }

    /// Color the fade overlay paints with.
    pub fn background(&self) -> Rgb {
        match self {
            ColorTheme::Ocean => Rgb::new(8, 10, 24),
            ColorTheme::Aurora => Rgb::new(6, 16, 20),
            ColorTheme::Ember => Rgb::new(18, 8, 6),
            ColorTheme::Mono => Rgb::BLACK,
        }
    }

    /// Color used for the help line.
    pub fn color(&self) -> Color {
        self.stroke().into()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorTheme::Ocean => "ocean",
            ColorTheme::Aurora => "aurora",
            ColorTheme::Ember => "ember",
            ColorTheme::Mono => "mono",
        }
    }

    /// Cycle to the next theme.
    pub fn next(&self) -> Self {
        match self {
            ColorTheme::Ocean => ColorTheme::Aurora,
            ColorTheme::Aurora => ColorTheme::Ember,
            ColorTheme::Ember => ColorTheme::Mono,
            ColorTheme::Mono => ColorTheme::Ocean,
        }
    }
}

/// Playback speed of the flow field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl FlowSpeed {
    /// Multiplier applied to the particle integration speed.
    pub fn multiplier(&self) -> f32 {
        match self {
            FlowSpeed::Slow => 0.5,
            FlowSpeed::Medium => 1.0,
            FlowSpeed::Fast => 1.8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowSpeed::Slow => "slow",
            FlowSpeed::Medium => "medium",
            FlowSpeed::Fast => "fast",
        }
    }

    /// Cycle to the next speed.
    pub fn next(&self) -> Self {
        match self {
            FlowSpeed::Slow => FlowSpeed::Medium,
            FlowSpeed::Medium => FlowSpeed::Fast,
            FlowSpeed::Fast => FlowSpeed::Slow,
        }
    }
}

/// Tunable parameters of the flow-field simulation.
///
/// Distances are in canvas pixels, times in frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Pool size on wide viewports.
    pub particle_count: usize,
    /// Pool size on viewports narrower than `narrow_breakpoint`.
    pub narrow_particle_count: usize,
    /// Viewport width (in columns) below which the narrow pool size applies.
    pub narrow_breakpoint: u32,
    /// Maximum number of recent positions kept per particle.
    pub trail_length: usize,
    /// Spatial frequency of the noise field.
    pub noise_scale: f64,
    /// Temporal frequency of the noise field, per tick.
    pub time_scale: f64,
    /// Magnitude of the per-frame flow force.
    pub force: f32,
    /// Per-frame velocity retention factor, below 1.
    pub damping: f32,
    /// Global integration speed.
    pub speed: f32,
    /// Opacity of the per-frame fade overlay.
    pub fade_alpha: f32,
    /// Opacity of a trail at full life.
    pub base_alpha: f32,
    /// Quiet window before a burst of resize events is applied.
    pub resize_debounce_ms: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            particle_count: 300,
            narrow_particle_count: 150,
            narrow_breakpoint: 80,
            trail_length: 20,
            noise_scale: 0.02,
            time_scale: 0.002,
            force: 0.1,
            damping: 0.95,
            speed: 0.6,
            fade_alpha: 0.08,
            base_alpha: 0.6,
            resize_debounce_ms: 250,
        }
    }
}

impl FlowSettings {
    /// Clamp every field into a range the simulation can run with.
    pub fn sanitized(mut self) -> Self {
        self.trail_length = self.trail_length.clamp(2, 256);
        self.damping = if self.damping.is_finite() {
            self.damping.clamp(0.0, 0.999)
        } else {
            0.95
        };
        self.fade_alpha = finite_or(self.fade_alpha, 0.08).clamp(0.0, 1.0);
        self.base_alpha = finite_or(self.base_alpha, 0.6).clamp(0.0, 1.0);
        self.force = finite_or(self.force, 0.1);
        self.speed = finite_or(self.speed, 0.6);
        if !self.noise_scale.is_finite() {
            self.noise_scale = 0.02;
        }
        if !self.time_scale.is_finite() {
            self.time_scale = 0.002;
        }
        self
    }

    /// Pool size for a viewport `columns` wide.
    pub fn target_count(&self, columns: u32) -> usize {
        if columns < self.narrow_breakpoint {
            self.narrow_particle_count
        } else {
            self.particle_count
        }
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}
