//! Demo Mode - simulated EKG signal source
//!
//! Generates a plausible EKG-shaped waveform so the engine (and a shell on
//! top of it) can be exercised without a sensor board attached. Stands in
//! for the Arduino sender: one ASCII millivolt reading per line at ~100 Hz.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use crate::transport::{LineTransport, TransportError};

/// Simulated heart rate
const HEART_RATE_BPM: f64 = 72.0;

/// Interval between emitted samples, matching the sender sketch's pace
const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Synthetic EKG waveform generator behind the [`LineTransport`] seam.
///
/// Each `read_line` call sleeps until the next sample is due and emits it
/// formatted exactly like the real sender (four decimal places).
pub struct DemoTransport {
    started: Instant,
    ticks: u64,
    interval: Duration,
    rng: StdRng,
}

impl Default for DemoTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoTransport {
    /// Create a demo source emitting at the sender sketch's rate
    pub fn new() -> Self {
        Self::with_interval(SAMPLE_INTERVAL)
    }

    /// Create a demo source with a custom sample interval
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            ticks: 0,
            interval,
            rng: StdRng::from_entropy(),
        }
    }

    /// Waveform value in millivolts at `t` seconds into the simulation.
    ///
    /// A crude PQRST shape: small P bump, sharp R spike flanked by Q and S
    /// dips, rounded T wave, slow baseline wander, and measurement jitter.
    fn waveform(&mut self, t: f64) -> f64 {
        let phase = (t * HEART_RATE_BPM / 60.0).fract();

        let p = 0.12 * bump(phase, 0.18, 0.025);
        let q = -0.2 * bump(phase, 0.27, 0.01);
        let r = 1.1 * bump(phase, 0.3, 0.008);
        let s = -0.25 * bump(phase, 0.33, 0.01);
        let t_wave = 0.3 * bump(phase, 0.55, 0.045);

        let wander = 0.05 * (t * 0.4 * TAU).sin();
        let jitter = self.rng.gen_range(-0.02..0.02);

        p + q + r + s + t_wave + wander + jitter
    }
}

/// Gaussian bump centered on `mean` with the given width
fn bump(x: f64, mean: f64, width: f64) -> f64 {
    let d = (x - mean) / width;
    (-0.5 * d * d).exp()
}

impl LineTransport for DemoTransport {
    fn read_line(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        // Pace emission to the sample interval
        let due = self.started + self.interval * self.ticks as u32;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }

        self.ticks += 1;
        let t = self.ticks as f64 * SAMPLE_INTERVAL.as_secs_f64();
        let millivolts = self.waveform(t);
        Ok(Some(format!("{millivolts:.4}").into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_line;

    #[test]
    fn test_every_line_decodes() {
        let mut demo = DemoTransport::with_interval(Duration::ZERO);
        for _ in 0..50 {
            let line = demo.read_line().unwrap().expect("demo always has data");
            let value = decode_line(&line).expect("demo emits valid decimals");
            assert!(value.is_finite());
            assert!(value.abs() < 5.0, "implausible amplitude: {value}");
        }
    }

    #[test]
    fn test_r_spike_is_present() {
        let mut demo = DemoTransport::with_interval(Duration::ZERO);
        // Two full beats at 72 bpm is under 2 s of simulated time,
        // i.e. under 200 samples
        let peak = (0..200)
            .map(|_| {
                let line = demo.read_line().unwrap().unwrap();
                decode_line(&line).unwrap()
            })
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(peak > 0.5, "no QRS spike in two beats (peak {peak})");
    }
}
