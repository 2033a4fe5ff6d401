//! Candidate throughput of the search stages (`progress` feature).
//!
//! Each stage reports how many candidates it evaluated and how long it took. The meter
//! keeps an exponential moving average of the rate `ema ← α·rate + (1 − α)·ema` in
//! candidates per second, and uses it to estimate the duration of the next stage from
//! its candidate count (`survivors × k_len`).
use std::time::Duration;

pub(crate) struct ThroughputMeter {
    ema_rate: Option<f64>,
    alpha: f64,
}

impl ThroughputMeter {
    /// `alpha ∈ (0, 1]`; `1.0` keeps only the last stage.
    pub(crate) fn new(alpha: f64) -> Self {
        Self {
            ema_rate: None,
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
        }
    }

    /// Record a finished stage and return its own rate in candidates per second.
    ///
    /// Stages too short to time, or with nothing evaluated, leave the average untouched.
    pub(crate) fn record(&mut self, candidates: usize, elapsed: Duration) -> Option<f64> {
        let secs = elapsed.as_secs_f64();
        if candidates == 0 || secs <= 0.0 {
            return None;
        }
        let rate = candidates as f64 / secs;
        self.ema_rate = Some(match self.ema_rate {
            None => rate,
            Some(ema) => self.alpha * rate + (1.0 - self.alpha) * ema,
        });
        Some(rate)
    }

    #[inline]
    pub(crate) fn rate(&self) -> Option<f64> {
        self.ema_rate
    }

    /// Expected duration of a stage evaluating `candidates` candidates.
    pub(crate) fn estimate(&self, candidates: usize) -> Option<Duration> {
        self.ema_rate
            .map(|rate| Duration::from_secs_f64(candidates as f64 / rate))
    }
}

pub(crate) fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        _ if d.as_millis() < 1_000 => format!("{}ms", d.as_millis()),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}

/// Candidates per second, `"850/s"`, `"12.4k/s"` or `"3.10M/s"`.
pub(crate) fn fmt_rate(rate: f64) -> String {
    match rate {
        r if r < 1e3 => format!("{r:.0}/s"),
        r if r < 1e6 => format!("{:.1}k/s", r / 1e3),
        r => format!("{:.2}M/s", r / 1e6),
    }
}
