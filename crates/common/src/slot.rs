use serde::{Deserialize, Serialize};

/// The known slots of the shared namespace. The Manager rejects any slot
/// name outside this enumeration instead of allowing arbitrary attribute
/// access, per the redesign away from a dynamic-attribute namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    MapCfg,
    ReadingsQueue,
    SensorAlerts,
    DronePositions,
    FinishedInspections,
    Logs,
    AddFaults,
    TimeSeconds,
}

impl Slot {
    pub const ALL: [Slot; 8] = [
        Slot::MapCfg,
        Slot::ReadingsQueue,
        Slot::SensorAlerts,
        Slot::DronePositions,
        Slot::FinishedInspections,
        Slot::Logs,
        Slot::AddFaults,
        Slot::TimeSeconds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Slot::MapCfg => "map_cfg",
            Slot::ReadingsQueue => "readings_queue",
            Slot::SensorAlerts => "sensor_alerts",
            Slot::DronePositions => "drone_positions",
            Slot::FinishedInspections => "finished_inspections",
            Slot::Logs => "logs",
            Slot::AddFaults => "add_faults",
            Slot::TimeSeconds => "time_seconds",
        }
    }

    pub fn parse(name: &str) -> Option<Slot> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Slots that support the atomic server-side append operation, rather
    /// than client-side read-modify-write.
    pub fn appendable(self) -> bool {
        matches!(self, Slot::Logs | Slot::FinishedInspections)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_parse_round_trip_for_every_slot() {
        for slot in Slot::ALL {
            assert_eq!(Slot::parse(slot.name()), Some(slot));
        }
    }

    #[test]
    fn unknown_slot_name_is_rejected() {
        assert_eq!(Slot::parse("not_a_real_slot"), None);
    }

    #[test]
    fn only_logs_and_finished_inspections_are_appendable() {
        assert!(Slot::Logs.appendable());
        assert!(Slot::FinishedInspections.appendable());
        assert!(!Slot::AddFaults.appendable());
        assert!(!Slot::MapCfg.appendable());
    }
}
