use kickviz::color::BarPalette;
use kickviz::config::{BarMode, BarShape, VisualizerConfig};
use kickviz::visualizer::BarFrame;
use ratatui::prelude::*;
use std::f32::consts::{FRAC_PI_2, TAU};

const BAR_CHAR: char = '█';
const CAP_CHAR: char = '▀';
const RAY_CHAR: char = '•';
const DOT_CHAR: char = '●';
const LINE_CHAR: char = '━';

/// Peaks below this are not drawn
const PEAK_VISIBLE: f32 = 0.01;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

/// Draw one tick's bars into `area` using the layout picked in `config`.
///
/// `config` should already be sanitized.
pub fn render(frame: &mut Frame, area: Rect, bars: BarFrame<'_>, config: &VisualizerConfig) {
    if area.width == 0 || area.height == 0 || bars.is_empty() {
        return;
    }

    let buf = frame.buffer_mut();
    match config.mode {
        BarMode::Bars => render_bars(buf, area, bars, config, false),
        BarMode::Mirrored => render_bars(buf, area, bars, config, true),
        BarMode::Radial => render_radial(buf, area, bars, config),
    }
}

/// Vertical bars from the bottom edge, optionally mirrored out of the center.
fn render_bars(buf: &mut Buffer, area: Rect, bars: BarFrame<'_>, config: &VisualizerConfig, mirror: bool) {
    let slot = i32::from(config.bar_width) + i32::from(config.gap);
    let width = i32::from(area.width);
    let max_h = area.height as f32;
    let center = width / 2;
    let palette = config.palette();

    for i in 0..bars.len() {
        let columns = if mirror {
            let right = center + i as i32 * slot;
            let left = center - (i as i32 + 1) * slot;
            if right >= width {
                break;
            }
            [Some(right), Some(left)]
        } else {
            let x = i as i32 * slot;
            if x >= width {
                break;
            }
            [Some(x), None]
        };

        let color = bar_color(&palette, i, bars.len());
        let bar_h = (bars.smoothed[i] * max_h * config.magnitude).clamp(0.0, max_h).round() as u16;
        let cap_row = (bars.peak[i] > PEAK_VISIBLE).then(|| {
            let peak_h = bars.peak[i] * max_h * config.magnitude;
            (max_h - peak_h).clamp(0.0, max_h - 1.0) as u16
        });

        for x in columns.into_iter().flatten() {
            for dx in 0..i32::from(config.bar_width) {
                let Some(cx) = column_x(area, x + dx) else {
                    continue;
                };
                for h in 0..bar_h {
                    if let Some(ch) = fill_char(config.shape, h, bar_h) {
                        put(buf, cx, area.y + area.height - 1 - h, ch, color);
                    }
                }
                if let Some(row) = cap_row {
                    put(buf, cx, area.y + row, CAP_CHAR, color);
                }
            }
        }
    }
}

/// Bars radiating from a ring, the first bar pointing straight up.
fn render_radial(buf: &mut Buffer, area: Rect, bars: BarFrame<'_>, config: &VisualizerConfig) {
    let (cx, cy, max_radius) = fit_circle(area.width as usize, area.height as usize, CELL_ASPECT);
    let base_radius = max_radius * (0.65 / 0.95);
    let palette = config.palette();
    let count = bars.len();

    for i in 0..count {
        let angle = i as f32 * TAU / count as f32 - FRAC_PI_2;
        let value = bars.smoothed[i].max(0.025);
        let length = (max_radius - base_radius) * (value * config.magnitude * 0.5).min(1.0);
        let color = bar_color(&palette, i, count);

        let steps = ((length * 2.0).ceil() as usize).max(1);
        for s in 0..=steps {
            let r = base_radius + length * s as f32 / steps as f32;
            let (gx, gy) = polar_to_grid(cx, cy, angle, r, CELL_ASPECT);
            if gx < 0.0 || gy < 0.0 {
                continue;
            }
            let (gx, gy) = (gx as u16, gy as u16);
            if gx < area.width && gy < area.height {
                put(buf, area.x + gx, area.y + gy, RAY_CHAR, color);
            }
        }
    }
}

/// Character for row `h` (0 = bottom) of a bar `bar_h` cells tall.
fn fill_char(shape: BarShape, h: u16, bar_h: u16) -> Option<char> {
    match shape {
        BarShape::Block => Some(BAR_CHAR),
        BarShape::Dots => (h % 2 == 0).then_some(DOT_CHAR),
        BarShape::Line => (h + 1 == bar_h).then_some(LINE_CHAR),
    }
}

fn bar_color(palette: &BarPalette, i: usize, count: usize) -> Color {
    let position = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.0 };
    let rgb = palette.at(position);
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn column_x(area: Rect, x: i32) -> Option<u16> {
    (0..i32::from(area.width))
        .contains(&x)
        .then(|| area.x + x as u16)
}

fn put(buf: &mut Buffer, x: u16, y: u16, ch: char, color: Color) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch);
        cell.set_fg(color);
    }
}

/// Convert polar coordinates to grid coordinates, stretching x by `aspect_ratio`.
#[inline]
fn polar_to_grid(cx: f32, cy: f32, angle: f32, radius: f32, aspect_ratio: f32) -> (f32, f32) {
    (cx + angle.cos() * radius * aspect_ratio, cy + angle.sin() * radius)
}

/// Circle that fits the area, in row units.
/// Returns (center_x, center_y, max_radius).
fn fit_circle(area_w: usize, area_h: usize, aspect_ratio: f32) -> (f32, f32, f32) {
    let cx = area_w as f32 / 2.0;
    let cy = area_h as f32 / 2.0;
    let effective_w = area_w as f32 / aspect_ratio;
    let max_radius = (effective_w.min(area_h as f32) / 2.0) * 0.95;
    (cx, cy, max_radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(config: &VisualizerConfig, smoothed: &[f32], peak: &[f32], width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        let bars = BarFrame { smoothed, peak };
        match config.mode {
            BarMode::Radial => render_radial(&mut buf, area, bars, config),
            mode => render_bars(&mut buf, area, bars, config, mode == BarMode::Mirrored),
        }
        buf
    }

    fn symbol(buf: &Buffer, x: u16, y: u16) -> &str {
        buf.cell((x, y)).map(|c| c.symbol()).unwrap_or("")
    }

    #[test]
    fn test_bar_heights_and_caps() {
        let config = VisualizerConfig {
            bar_width: 1,
            gap: 1,
            ..Default::default()
        };
        let buf = draw(&config, &[0.5, 0.0], &[0.8, 0.005], 4, 10);

        // Bar 0: five cells tall from the bottom, cap two rows from the top
        for y in 5..10 {
            assert_eq!(symbol(&buf, 0, y), "█");
        }
        assert_eq!(symbol(&buf, 0, 4), " ");
        assert_eq!(symbol(&buf, 0, 2), "▀");

        // Gap column and the silent bar stay empty
        assert!((0..10).all(|y| symbol(&buf, 1, y) == " "));
        assert!((0..10).all(|y| symbol(&buf, 2, y) == " "));
    }

    #[test]
    fn test_dots_and_line_shapes() {
        let dots = VisualizerConfig {
            shape: BarShape::Dots,
            bar_width: 1,
            ..Default::default()
        };
        let buf = draw(&dots, &[0.5], &[0.0], 1, 10);
        // Five rows tall: dots on every other row from the bottom
        for y in [9, 7, 5] {
            assert_eq!(symbol(&buf, 0, y), "●");
        }
        for y in [8, 6, 4, 0] {
            assert_eq!(symbol(&buf, 0, y), " ");
        }

        let line = VisualizerConfig {
            shape: BarShape::Line,
            bar_width: 1,
            ..Default::default()
        };
        let buf = draw(&line, &[0.5], &[0.0], 1, 10);
        assert_eq!(symbol(&buf, 0, 5), "━");
        assert!((6..10).all(|y| symbol(&buf, 0, y) == " "));
        assert!((0..5).all(|y| symbol(&buf, 0, y) == " "));
    }

    #[test]
    fn test_bars_clip_to_width() {
        let config = VisualizerConfig {
            bar_width: 3,
            gap: 1,
            ..Default::default()
        };
        let buf = draw(&config, &[1.0; 8], &[1.0; 8], 6, 4);
        assert_eq!(symbol(&buf, 5, 3), "█");
        assert_eq!(symbol(&buf, 3, 3), " ");
    }

    #[test]
    fn test_mirrored_is_symmetric() {
        let config = VisualizerConfig {
            mode: BarMode::Mirrored,
            bar_width: 1,
            gap: 0,
            ..Default::default()
        };
        let buf = draw(&config, &[1.0, 0.5], &[0.0, 0.0], 8, 4);

        // Bar 0 at columns 4 and 3, bar 1 at 5 and 2
        assert_eq!(symbol(&buf, 4, 0), "█");
        assert_eq!(symbol(&buf, 3, 0), "█");
        assert_eq!(symbol(&buf, 5, 2), "█");
        assert_eq!(symbol(&buf, 2, 2), "█");
        assert_eq!(symbol(&buf, 5, 1), " ");
    }

    #[test]
    fn test_radial_stays_in_bounds() {
        let config = VisualizerConfig {
            mode: BarMode::Radial,
            magnitude: 20.0,
            ..Default::default()
        };
        let buf = draw(&config, &[1.0; 32], &[1.0; 32], 40, 20);
        let drawn = buf.content().iter().filter(|c| c.symbol() == "•").count();
        assert!(drawn > 32);
    }

    #[test]
    fn test_fit_circle_aspect() {
        let (cx, cy, r) = fit_circle(80, 24, 2.0);
        assert_eq!((cx, cy), (40.0, 12.0));
        assert!((r - 11.4).abs() < 1e-4);
    }
}
