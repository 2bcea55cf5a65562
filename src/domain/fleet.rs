use std::collections::BTreeMap;

use crate::domain::profile::FleetSpec;

/// Default synthetic vehicle used in Phase 2 once the profiled fleet is
/// exhausted; its routes never touch the ledger.
pub const DEFAULT_VEHICLE_TYPE: &str = "DEFAULT";
pub const DEFAULT_VEHICLE_CAPACITY: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct FleetEntry {
    pub remaining_count: u32,
    pub capacity: u32,
}

/// Tracks how many vehicles of each type remain available for Phase 1.
#[derive(Debug, Clone, Default)]
pub struct FleetLedger {
    entries: BTreeMap<String, FleetEntry>,
}

impl FleetLedger {
    pub fn new(fleet: &[FleetSpec]) -> Self {
        let mut entries = BTreeMap::new();
        for spec in fleet {
            entries.insert(
                spec.vehicle_type.clone(),
                FleetEntry {
                    remaining_count: spec.count,
                    capacity: spec.capacity,
                },
            );
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|e| e.remaining_count == 0)
    }

    /// The vehicle type with the largest capacity that still has a vehicle
    /// available, per the Phase 1 "pick the largest available capacity" rule.
    pub fn largest_available(&self) -> Option<(String, FleetEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.remaining_count > 0)
            .max_by_key(|(_, e)| e.capacity)
            .map(|(name, entry)| (name.clone(), *entry))
    }

    /// The smallest vehicle type whose capacity is >= `batch_size`; falls
    /// back to the largest available type if none fits exactly.
    pub fn smallest_fitting(&self, batch_size: u32) -> Option<(String, FleetEntry)> {
        let fitting = self
            .entries
            .iter()
            .filter(|(_, e)| e.remaining_count > 0 && e.capacity >= batch_size)
            .min_by_key(|(_, e)| e.capacity)
            .map(|(name, entry)| (name.clone(), *entry));
        fitting.or_else(|| self.largest_available())
    }

    pub fn decrement(&mut self, vehicle_type: &str) -> Result<(), String> {
        match self.entries.get_mut(vehicle_type) {
            Some(entry) if entry.remaining_count > 0 => {
                entry.remaining_count -= 1;
                Ok(())
            }
            Some(_) => Err(format!("vehicle type {vehicle_type} has no remaining count")),
            None => Err(format!("unknown vehicle type {vehicle_type}")),
        }
    }

    pub fn remaining_count(&self, vehicle_type: &str) -> u32 {
        self.entries
            .get(vehicle_type)
            .map(|e| e.remaining_count)
            .unwrap_or(0)
    }
}
