//! Flat key-value field list for host persistence and display.
//!
//! Hosts store component state as string pairs. [`FIELDS`] describes every
//! field with its default and whether it is saved; [`to_fields`] and
//! [`from_fields`] convert a [`ReliabilityState`] to and from that form.

use crate::reliability::{FailureKind, ReliabilityState, DEFAULT_QUALITY, DEFAULT_RELIABILITY};

/// One entry of the field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub persisted: bool,
    /// Shown to the player.
    pub displayed: bool,
}

pub const QUALITY: &str = "quality";
pub const RELIABILITY: &str = "reliability";
pub const FAILURE: &str = "failure";
pub const REPAIR_PROGRESS: &str = "repair_progress";
pub const TIME_SINCE_CHECK: &str = "time_since_check";

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: QUALITY,
        default: "0.75",
        persisted: true,
        displayed: true,
    },
    FieldSpec {
        name: RELIABILITY,
        default: "1",
        persisted: true,
        displayed: true,
    },
    FieldSpec {
        name: FAILURE,
        default: "",
        persisted: true,
        displayed: true,
    },
    FieldSpec {
        name: REPAIR_PROGRESS,
        default: "0",
        persisted: true,
        displayed: true,
    },
    FieldSpec {
        name: TIME_SINCE_CHECK,
        default: "0",
        persisted: true,
        displayed: false,
    },
];

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Persisted fields of `state` as name/value pairs, in schema order.
pub fn to_fields(state: &ReliabilityState) -> Vec<(&'static str, String)> {
    FIELDS
        .iter()
        .filter(|f| f.persisted)
        .map(|f| {
            let value = match f.name {
                QUALITY => state.quality.to_string(),
                RELIABILITY => state.reliability.to_string(),
                FAILURE => state.failure.map(|k| k.token().to_string()).unwrap_or_default(),
                REPAIR_PROGRESS => state.repair_progress.to_string(),
                TIME_SINCE_CHECK => state.time_since_check.to_string(),
                _ => f.default.to_string(),
            };
            (f.name, value)
        })
        .collect()
}

/// Rebuild a state from saved pairs.
///
/// Missing fields take their defaults; unknown names and unparsable values
/// are skipped with a warning. The result is clamped and a failed state
/// always has outstanding repair progress.
pub fn from_fields<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> ReliabilityState {
    let mut state = ReliabilityState {
        quality: DEFAULT_QUALITY,
        reliability: DEFAULT_RELIABILITY,
        failure: None,
        repair_progress: 0,
        time_since_check: 0.0,
    };
    for (name, value) in pairs {
        let value = value.trim();
        let parsed = match name {
            QUALITY => value.parse::<f32>().map(|q| state.quality = q).is_ok(),
            RELIABILITY => value.parse::<f64>().map(|r| state.reliability = r).is_ok(),
            REPAIR_PROGRESS => value.parse::<u32>().map(|p| state.repair_progress = p).is_ok(),
            TIME_SINCE_CHECK => value.parse::<f32>().map(|t| state.time_since_check = t).is_ok(),
            FAILURE if value.is_empty() => {
                state.failure = None;
                true
            }
            FAILURE => match FailureKind::from_token(value) {
                Some(kind) => {
                    state.failure = Some(kind);
                    true
                }
                None => false,
            },
            _ => {
                log::warn!("ignoring unknown field {:?}", name);
                continue;
            }
        };
        if !parsed {
            log::warn!("ignoring bad value {:?} for field {}", value, name);
        }
    }
    state.quality = if state.quality.is_finite() {
        state.quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_QUALITY
    };
    state.clamp();
    if state.failure.is_none() {
        state.repair_progress = 0;
    } else if state.repair_progress == 0 {
        state.repair_progress = 1;
    }
    state
}
