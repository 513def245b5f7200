//! Render Throttling
//!
//! Bounds redraw frequency so live plotting stays affordable at the
//! sender's sample rate, and computes the axis-fit window for the most
//! recent samples.

use serde::Serialize;

use crate::datalog::Sample;

/// Redraw once per this many appended samples
pub const DEFAULT_RENDER_DECIMATION: usize = 10;

/// Width of the rolling time-axis view, in seconds
pub const X_SPAN_SECS: f64 = 10.0;

/// Floor for vertical padding around the fitted y-range, in millivolts.
/// Keeps a flat trace from collapsing into a zero-height window.
const MIN_Y_PADDING: f64 = 0.5;

/// Decides, from the buffer's growth, when a render notification is due
#[derive(Debug, Clone, Copy)]
pub struct RenderThrottle {
    every: usize,
}

impl Default for RenderThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_DECIMATION)
    }
}

impl RenderThrottle {
    /// Create a throttle that fires once per `every` appended samples
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Whether a render is due once the buffer has grown to `appended`
    /// samples. Fires exactly on the 10th, 20th, ... append for the
    /// default factor.
    pub fn is_due(&self, appended: usize) -> bool {
        appended > 0 && appended % self.every == 0
    }
}

/// Axis-fit window for the live plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderWindow {
    /// Left edge of the time axis, seconds
    pub x_min: f64,
    /// Right edge of the time axis, seconds
    pub x_max: f64,
    /// Bottom edge of the voltage axis, millivolts
    pub y_min: f64,
    /// Top edge of the voltage axis, millivolts
    pub y_max: f64,
}

impl RenderWindow {
    /// Fit a window around a snapshot's samples, or `None` when empty.
    ///
    /// The time axis shows the most recent [`X_SPAN_SECS`] seconds once the
    /// recording has run that long, and stays fixed at `[0, X_SPAN_SECS]`
    /// before then. The voltage axis spans the full snapshot's min/max with
    /// ten percent padding, floored at half a millivolt.
    pub fn fit(samples: &[Sample]) -> Option<Self> {
        let newest = samples.last()?.elapsed_secs;

        let (x_min, x_max) = if newest > X_SPAN_SECS {
            (newest - X_SPAN_SECS, newest)
        } else {
            (0.0, X_SPAN_SECS)
        };

        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for sample in samples {
            y_min = y_min.min(sample.value);
            y_max = y_max.max(sample.value);
        }

        let padding = (0.1 * (y_max - y_min)).max(MIN_Y_PADDING);
        Some(Self {
            x_min,
            x_max,
            y_min: y_min - padding,
            y_max: y_max + padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_throttle_fires_on_exact_multiples() {
        let throttle = RenderThrottle::default();
        let due: Vec<usize> = (1..=30).filter(|&n| throttle.is_due(n)).collect();
        assert_eq!(due, vec![10, 20, 30]);
    }

    #[test]
    fn test_throttle_never_fires_on_zero() {
        assert!(!RenderThrottle::default().is_due(0));
        assert!(!RenderThrottle::new(0).is_due(0));
    }

    #[test]
    fn test_custom_decimation_factor() {
        let throttle = RenderThrottle::new(3);
        let due: Vec<usize> = (1..=10).filter(|&n| throttle.is_due(n)).collect();
        assert_eq!(due, vec![3, 6, 9]);
    }

    #[test]
    fn test_empty_snapshot_has_no_window() {
        assert_eq!(RenderWindow::fit(&[]), None);
    }

    #[test]
    fn test_single_sample_uses_padding_floor() {
        let window = RenderWindow::fit(&[Sample::new(0.01, 1.0)]).unwrap();
        assert_eq!(window.y_min, 0.5);
        assert_eq!(window.y_max, 1.5);
    }

    #[test]
    fn test_time_axis_fixed_before_first_scroll() {
        let samples = [Sample::new(0.0, 0.1), Sample::new(4.2, 0.2)];
        let window = RenderWindow::fit(&samples).unwrap();
        assert_eq!(window.x_min, 0.0);
        assert_eq!(window.x_max, 10.0);
    }

    #[test]
    fn test_time_axis_scrolls_with_latest_sample() {
        let samples = [Sample::new(0.0, 0.1), Sample::new(12.5, 0.2)];
        let window = RenderWindow::fit(&samples).unwrap();
        assert_eq!(window.x_min, 2.5);
        assert_eq!(window.x_max, 12.5);
    }

    #[test]
    fn test_wide_range_uses_proportional_padding() {
        let samples = [Sample::new(0.0, -10.0), Sample::new(1.0, 10.0)];
        let window = RenderWindow::fit(&samples).unwrap();
        // span 20, so padding is 2.0 rather than the 0.5 floor
        assert_eq!(window.y_min, -12.0);
        assert_eq!(window.y_max, 12.0);
    }
}
