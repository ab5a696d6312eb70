//! Inline SVG bar chart of feedback per product
//!
//! Geometry is computed here so the template only places rectangles and
//! labels. The y axis always starts at zero and ticks in whole feedback
//! counts.

use crate::stats::ChartBar;

const WIDTH: u32 = 720;
const HEIGHT: u32 = 320;
const MARGIN_LEFT: u32 = 48;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 16;
const MARGIN_BOTTOM: u32 = 64;
const MAX_TICKS: usize = 6;

/// A positioned bar
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub count: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Horizontal centre, for the label under the bar
    pub center: f64,
}

/// A horizontal grid line with its value
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: usize,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub width: u32,
    pub height: u32,
    pub plot_left: u32,
    pub plot_right: u32,
    /// y coordinate of the x axis
    pub baseline: f64,
    pub label_y: f64,
    pub bars: Vec<Bar>,
    pub ticks: Vec<Tick>,
}

impl BarChart {
    pub fn new(series: &[ChartBar]) -> Self {
        let plot_width = f64::from(WIDTH - MARGIN_LEFT - MARGIN_RIGHT);
        let plot_height = f64::from(HEIGHT - MARGIN_TOP - MARGIN_BOTTOM);
        let baseline = f64::from(HEIGHT - MARGIN_BOTTOM);

        let max_count = series.iter().map(|b| b.count).max().unwrap_or(0);
        let step = tick_step(max_count);
        // Round the axis up to a whole step, and show at least one step
        let axis_max = max_count.div_ceil(step).max(1) * step;
        let scale = plot_height / axis_max as f64;

        let slot = if series.is_empty() {
            plot_width
        } else {
            plot_width / series.len() as f64
        };
        let bar_width = slot * 0.6;

        let bars = series
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let height = b.count as f64 * scale;
                let x = f64::from(MARGIN_LEFT) + slot * i as f64 + (slot - bar_width) / 2.0;
                Bar {
                    label: b.label.clone(),
                    count: b.count,
                    x,
                    y: baseline - height,
                    width: bar_width,
                    height,
                    center: x + bar_width / 2.0,
                }
            })
            .collect();

        let ticks = (0..=axis_max)
            .step_by(step)
            .map(|value| Tick {
                value,
                y: baseline - value as f64 * scale,
            })
            .collect();

        Self {
            width: WIDTH,
            height: HEIGHT,
            plot_left: MARGIN_LEFT,
            plot_right: WIDTH - MARGIN_RIGHT,
            baseline,
            label_y: baseline + 20.0,
            bars,
            ticks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.iter().all(|b| b.count == 0)
    }
}

/// Smallest whole step keeping the tick count at or under [`MAX_TICKS`]
fn tick_step(max_count: usize) -> usize {
    max_count.div_ceil(MAX_TICKS).max(1)
}
