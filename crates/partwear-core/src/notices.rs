//! Failure notifications for the host UI.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::PartId;
use partwear_logic::reliability::{ComponentKind, FailureKind};
use partwear_logic::tuning::Settings;

/// Retained notices; older ones are dropped first.
const MAX_NOTICES: usize = 64;

/// One failure announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureNotice {
    pub part: PartId,
    pub component: ComponentKind,
    pub failure: FailureKind,
    /// "FAILURE: <part title><suffix>"
    pub message: String,
    pub halt_time_warp: bool,
    pub alert: bool,
    pub highlight: bool,
}

/// Suffix appended to the part title in a failure message
pub fn failure_suffix(component: ComponentKind, failure: FailureKind, detail: Option<&str>) -> String {
    match (component, failure) {
        (ComponentKind::Ignitor, _) => "'s ignition coil has burnt out!".to_string(),
        (ComponentKind::Cooling, _) => "'s cooling system has failed!".to_string(),
        (ComponentKind::Gimbal, FailureKind::Locked) => "'s gimbal has locked up for good!".to_string(),
        (ComponentKind::Gimbal, _) => "'s gimbal is stuck!".to_string(),
        (ComponentKind::Tank, _) => format!(" has begun leaking {}!", detail.unwrap_or("resources")),
        (ComponentKind::Light, FailureKind::Flickering) => {
            "'s light has begun flickering. Replace soon.".to_string()
        }
        (ComponentKind::Light, _) => " has busted its light bulb.".to_string(),
        (ComponentKind::Alternator, _) => "'s alternator has failed!".to_string(),
        (ComponentKind::Decoupler, _) => " failed to decouple!".to_string(),
        (ComponentKind::Altimeter, _) => "'s altimeter is stuck!".to_string(),
        (ComponentKind::ThrustGauge, _) => "'s thrust gauge is stuck!".to_string(),
        (ComponentKind::Monitor, _) => " has failed!".to_string(),
    }
}

impl FailureNotice {
    pub fn new(
        part: PartId,
        title: &str,
        component: ComponentKind,
        failure: FailureKind,
        detail: Option<&str>,
        settings: &Settings,
    ) -> Self {
        Self {
            part,
            component,
            failure,
            message: format!("FAILURE: {}{}", title, failure_suffix(component, failure, detail)),
            halt_time_warp: settings.stop_time_warp_on_failure,
            alert: settings.alert_message_on_failure,
            highlight: settings.highlight_failed_parts,
        }
    }
}

/// Bounded queue of notices waiting for the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeBoard {
    notices: VecDeque<FailureNotice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, notice: FailureNotice) {
        if notice.alert {
            log::info!("{}", notice.message);
        }
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Take every pending notice, oldest first
    pub fn drain(&mut self) -> Vec<FailureNotice> {
        self.notices.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureNotice> {
        self.notices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        let notice = FailureNotice::new(
            PartId(3),
            "FL-T400 Fuel Tank",
            ComponentKind::Tank,
            FailureKind::Leaking,
            Some("LiquidFuel"),
            &Settings::default(),
        );
        assert_eq!(
            notice.message,
            "FAILURE: FL-T400 Fuel Tank has begun leaking LiquidFuel!"
        );
        assert!(notice.halt_time_warp);
    }

    #[test]
    fn test_settings_control_flags() {
        let settings = Settings {
            stop_time_warp_on_failure: false,
            alert_message_on_failure: false,
            ..Settings::default()
        };
        let notice = FailureNotice::new(
            PartId(1),
            "LV-T30",
            ComponentKind::Ignitor,
            FailureKind::Burnt,
            None,
            &settings,
        );
        assert!(!notice.halt_time_warp);
        assert!(!notice.alert);
        assert!(notice.highlight);
    }

    #[test]
    fn test_board_is_bounded() {
        let mut board = NoticeBoard::new();
        for i in 0..(MAX_NOTICES as u32 + 10) {
            board.post(FailureNotice::new(
                PartId(i),
                "Part",
                ComponentKind::Gimbal,
                FailureKind::Stuck,
                None,
                &Settings::default(),
            ));
        }
        assert_eq!(board.len(), MAX_NOTICES);
        let drained = board.drain();
        assert_eq!(drained[0].part, PartId(10));
        assert!(board.is_empty());
    }
}
