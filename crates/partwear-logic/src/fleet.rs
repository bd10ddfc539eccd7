//! Vessel-wide aggregation over same-kind components.
//!
//! Instruments on a vessel are redundant: a readout only degrades when
//! every instrument of that kind has failed. Mean reliability drives a
//! continuous display inaccuracy instead of a hard cutoff.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::reliability::ReliabilityState;

/// Mean reliability below which displays start to wander.
pub const INACCURACY_FLOOR: f64 = 0.5;

/// Summary of one group of components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetSummary {
    pub count: usize,
    pub failed: usize,
    pub mean_reliability: f64,
}

impl FleetSummary {
    pub fn from_states<'a>(members: impl IntoIterator<Item = &'a ReliabilityState>) -> Self {
        let mut summary = FleetSummary::default();
        let mut total = 0.0;
        for state in members {
            summary.count += 1;
            total += state.reliability;
            if state.is_failed() {
                summary.failed += 1;
            }
        }
        if summary.count > 0 {
            summary.mean_reliability = total / summary.count as f64;
        }
        summary
    }

    /// True iff the group is non-empty and every member has failed.
    pub fn all_failed(&self) -> bool {
        self.count > 0 && self.failed == self.count
    }

    pub fn any_failed(&self) -> bool {
        self.failed > 0
    }
}

pub fn all_failed<'a>(members: impl IntoIterator<Item = &'a ReliabilityState>) -> bool {
    FleetSummary::from_states(members).all_failed()
}

/// Mean reliability, or `None` for an empty group.
pub fn mean_reliability<'a>(members: impl IntoIterator<Item = &'a ReliabilityState>) -> Option<f64> {
    let summary = FleetSummary::from_states(members);
    (summary.count > 0).then_some(summary.mean_reliability)
}

/// Half-width of the inaccuracy band: `max(0.5 - mean, 0) / 2`.
pub fn inaccuracy_severity(mean: f64) -> f64 {
    (INACCURACY_FLOOR - mean).max(0.0) / 2.0
}

/// Random display offset, resampled at random intervals in [0.25, 5) s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InaccuracyDriver {
    pub offset: f64,
    pub resample_after: f32,
    pub elapsed: f32,
}

impl InaccuracyDriver {
    pub fn tick(&mut self, rng: &mut impl Rng, dt: f32, mean: f64) -> f64 {
        self.elapsed += dt;
        if self.elapsed < self.resample_after {
            return self.offset;
        }
        self.elapsed = 0.0;
        self.resample_after = rng.gen_range(0.25..5.0);
        let severity = inaccuracy_severity(mean);
        self.offset = if severity > 0.0 {
            rng.gen_range(-severity..=severity)
        } else {
            0.0
        };
        self.offset
    }

    /// Reliability as displayed: `clamp01(mean + offset)`.
    pub fn displayed(&self, mean: f64) -> f64 {
        (mean + self.offset).clamp(0.0, 1.0)
    }
}

/// Altimeter readout. A fabricated reading is latched while every
/// altimeter is failed and dropped once any recovers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AltimeterReadout {
    pub false_reading: Option<f64>,
}

impl AltimeterReadout {
    pub fn update(&mut self, rng: &mut impl Rng, all_failed: bool, true_altitude: f64) -> f64 {
        if !all_failed {
            self.false_reading = None;
            return true_altitude;
        }
        *self
            .false_reading
            .get_or_insert_with(|| rng.gen_range(0..i32::MAX) as f64)
    }
}

/// Thrust gauge readout. Freezes at the last good value while every gauge
/// is failed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThrustReadout {
    pub last_good: f64,
    pub frozen: bool,
}

impl ThrustReadout {
    pub fn update(&mut self, all_failed: bool, true_thrust: f64) -> f64 {
        self.frozen = all_failed;
        if !all_failed {
            self.last_good = true_thrust;
        }
        self.last_good
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::FailureKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn failed() -> ReliabilityState {
        let mut s = ReliabilityState::default();
        s.set_failure(FailureKind::Stuck, 10);
        s
    }

    #[test]
    fn test_all_failed_requires_members() {
        assert!(!all_failed(std::iter::empty()));
        let group = vec![failed(), failed()];
        assert!(all_failed(&group));
        let group = vec![failed(), ReliabilityState::default()];
        assert!(!all_failed(&group));
    }

    #[test]
    fn test_mean_reliability() {
        let mut a = ReliabilityState::default();
        a.reliability = 0.2;
        let b = ReliabilityState::default();
        let group = vec![a, b];
        assert!((mean_reliability(&group).unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(mean_reliability(std::iter::empty()), None);
    }

    #[test]
    fn test_severity_grows_as_mean_falls() {
        assert_eq!(inaccuracy_severity(0.8), 0.0);
        assert_eq!(inaccuracy_severity(0.5), 0.0);
        assert!((inaccuracy_severity(0.1) - 0.2).abs() < 1e-12);
        assert!(inaccuracy_severity(0.0) > inaccuracy_severity(0.3));
    }

    #[test]
    fn test_inaccuracy_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut driver = InaccuracyDriver::default();
        for _ in 0..500 {
            let offset = driver.tick(&mut rng, 0.5, 0.1);
            assert!(offset.abs() <= 0.2 + 1e-12);
        }
        let mut healthy = InaccuracyDriver::default();
        for _ in 0..50 {
            assert_eq!(healthy.tick(&mut rng, 1.0, 0.9), 0.0);
        }
    }

    #[test]
    fn test_altimeter_latches_false_reading() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut readout = AltimeterReadout::default();
        assert_eq!(readout.update(&mut rng, false, 1200.0), 1200.0);
        let first = readout.update(&mut rng, true, 1300.0);
        let second = readout.update(&mut rng, true, 1400.0);
        assert_eq!(first, second);
        assert!(first >= 0.0 && first < i32::MAX as f64);
        assert_eq!(readout.update(&mut rng, false, 1500.0), 1500.0);
        assert_eq!(readout.false_reading, None);
    }

    #[test]
    fn test_thrust_freezes() {
        let mut readout = ThrustReadout::default();
        assert_eq!(readout.update(false, 200.0), 200.0);
        assert_eq!(readout.update(true, 0.0), 200.0);
        assert!(readout.frozen);
        assert_eq!(readout.update(false, 50.0), 50.0);
    }
}
