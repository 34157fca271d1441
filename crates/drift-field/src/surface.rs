//! Drawing surfaces the flow field paints onto.

use drift_core::Rgb;

/// A 2D raster the simulator draws each frame onto.
pub trait Surface {
    /// Size in pixels as `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Change the pixel dimensions. Contents are cleared.
    fn resize(&mut self, width: u32, height: u32);

    /// Blend `color` over a rectangle with the given opacity.
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb, alpha: f32);

    /// Stroke a connected polyline through `points` with the given opacity.
    fn stroke_polyline<I>(&mut self, points: I, color: Rgb, alpha: f32)
    where
        I: IntoIterator<Item = (f32, f32)>;
}

/// In-memory RGB raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Canvas {
    /// Create a canvas cleared to black. Returns `None` for an empty area.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; (width * height) as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Blend a single pixel, ignoring coordinates outside the canvas.
    fn plot(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.pixels[idx] = self.pixels[idx].blend(color, alpha);
    }

    /// Rasterize a segment with a DDA walk. `skip_start` leaves out the first
    /// pixel so joints of a polyline are not blended twice.
    fn segment(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, alpha: f32, skip_start: bool) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        let first = if skip_start { 1 } else { 0 };
        for i in first..=steps {
            let t = i as f32 / steps as f32;
            let x = (from.0 + dx * t).floor() as i64;
            let y = (from.1 + dy * t).floor() as i64;
            self.plot(x, y, color, alpha);
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize((width * height) as usize, Rgb::BLACK);
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb, alpha: f32) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for py in y..y_end {
            let row = (py * self.width) as usize;
            for px in x..x_end {
                let idx = row + px as usize;
                self.pixels[idx] = self.pixels[idx].blend(color, alpha);
            }
        }
    }

    fn stroke_polyline<I>(&mut self, points: I, color: Rgb, alpha: f32)
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut points = points.into_iter();
        let Some(mut prev) = points.next() else {
            return;
        };
        let mut first = true;
        for point in points {
            self.segment(prev, point, color, alpha, !first);
            first = false;
            prev = point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[test]
    fn test_empty_canvas_is_none() {
        assert!(Canvas::new(0, 10).is_none());
        assert!(Canvas::new(10, 0).is_none());
    }

    #[test]
    fn test_fill_rect_blends_and_clips() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.fill_rect(2, 2, 10, 10, WHITE, 1.0);
        assert_eq!(canvas.pixel(3, 3), Some(WHITE));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb::BLACK));

        canvas.fill_rect(0, 0, 4, 4, Rgb::BLACK, 0.5);
        assert_eq!(canvas.pixel(3, 3), Some(Rgb::new(128, 128, 128)));
    }

    #[test]
    fn test_stroke_horizontal_line() {
        let mut canvas = Canvas::new(10, 3).unwrap();
        canvas.stroke_polyline([(1.0, 1.0), (5.0, 1.0)], WHITE, 1.0);
        for x in 1..=5 {
            assert_eq!(canvas.pixel(x, 1), Some(WHITE));
        }
        assert_eq!(canvas.pixel(6, 1), Some(Rgb::BLACK));
        assert_eq!(canvas.pixel(0, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn test_stroke_joint_blended_once() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.stroke_polyline([(1.0, 1.0), (4.0, 1.0), (4.0, 4.0)], WHITE, 0.5);
        // The corner would be 191 if it were blended twice
        assert_eq!(canvas.pixel(4, 1), Some(Rgb::new(128, 128, 128)));
    }

    #[test]
    fn test_stroke_outside_is_clipped() {
        let mut canvas = Canvas::new(5, 5).unwrap();
        canvas.stroke_polyline([(-10.0, 2.0), (20.0, 2.0)], WHITE, 1.0);
        for x in 0..5 {
            assert_eq!(canvas.pixel(x, 2), Some(WHITE));
        }
        assert_eq!(canvas.pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn test_resize_clears() {
        let mut canvas = Canvas::new(3, 3).unwrap();
        canvas.fill_rect(0, 0, 3, 3, WHITE, 1.0);
        canvas.resize(6, 2);
        assert_eq!(canvas.size(), (6, 2));
        assert_eq!(canvas.pixel(5, 1), Some(Rgb::BLACK));
        assert_eq!(canvas.pixel(0, 2), None);
    }
}
