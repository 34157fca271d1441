//! Terminal rendering of a [`Canvas`].
//!
//! Each terminal cell shows two vertically stacked pixels: the upper half
//! block is drawn in the top pixel's color over the bottom pixel's color.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::surface::Canvas;

const UPPER_HALF: &str = "▀";

/// Pixel size of a canvas covering `area`.
pub fn canvas_size(area: Rect) -> (u32, u32) {
    (area.width as u32, area.height as u32 * 2)
}

/// Render the canvas into `area` of the frame.
pub fn render_canvas(frame: &mut Frame, canvas: &Canvas, area: Rect) {
    frame.render_widget(Paragraph::new(canvas_lines(canvas, area)), area);
}

fn canvas_lines(canvas: &Canvas, area: Rect) -> Vec<Line<'static>> {
    (0..area.height as u32)
        .map(|row| {
            let spans: Vec<Span> = (0..area.width as u32)
                .map(|x| cell_span(canvas, x, row * 2))
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn cell_span(canvas: &Canvas, x: u32, y: u32) -> Span<'static> {
    match (canvas.pixel(x, y), canvas.pixel(x, y + 1)) {
        (Some(top), Some(bottom)) => {
            Span::styled(UPPER_HALF, Style::new().fg(top.into()).bg(bottom.into()))
        }
        (Some(top), None) => Span::styled(UPPER_HALF, Style::new().fg(top.into())),
        _ => Span::raw(" "),
    }
}
