//! Ration Status Tool
//!
//! Provides runtime status information about the Ration service.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::nutrition::{UnitTable, UnitTableSource};

/// Ingredient editing instructions for AI assistants
pub const EDIT_INSTRUCTIONS: &str = r#"
# Ration Ingredient Editing Instructions

## Workflow

1. `open_ingredient` with the meal and ingredient IDs and the values the planner currently shows
2. Adjust with `set_nutrient`, `set_weight` / `set_quantity`, `set_density`, `select_unit`,
   `set_pieces_reference` / `clear_pieces_reference`
3. `submit_ingredient` to send the edit to the planning service
4. `reset_ingredient` discards local edits at any time

## Nutrients

- Percentages 0-100 for protein, fat, carbs, fiber and salt
- Water is never set directly: it is 100 minus the others, and never below 0
- If the others add up to more than 100 the view carries a warning; nothing is rescaled
  locally, the planning service decides on submit

## Units

- All weights are stored in grams
- Volume units (TEASPOON, CUP, ...) need a density in g/ml (default 1.0)
- PCS needs a piece weight from `set_pieces_reference`; without it the quantity shows "unavailable"

## Errors

- Invalid input leaves the previous values in place and explains why in `status`
- A rejected submit restores the last saved values and applies the service's nutrient snapshot
"#;

/// Runtime status
#[derive(Debug, Serialize)]
pub struct RationStatus {
    pub build: BuildInfo,
    pub planning_service: PlanningServiceStatus,
    pub process: ProcessStatus,
}

/// Where edits go and which units they can use
#[derive(Debug, Serialize)]
pub struct PlanningServiceStatus {
    pub api_base_url: String,
    pub unit_table: UnitTableStatus,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnitTableStatus {
    pub source: UnitTableSource,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProcessStatus {
    pub id: u32,
    pub started_at: String,
    pub uptime_seconds: u64,
    pub memory_usage_bytes: u64,
}

/// Resident memory of a process, 0 when it cannot be read
fn process_memory(pid: u32) -> u64 {
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    sys.process(pid).map(|p| p.memory()).unwrap_or(0)
}

/// Tracks service start and reports status
pub struct StatusTracker {
    start_time: Instant,
    started_at: chrono::DateTime<chrono::Utc>,
    api_base_url: String,
    unit_table: UnitTableStatus,
}

impl StatusTracker {
    pub fn new(api_base_url: String, units: &UnitTable) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: chrono::Utc::now(),
            api_base_url,
            unit_table: UnitTableStatus {
                source: units.source(),
                count: units.len(),
            },
        }
    }

    pub fn get_status(&self) -> RationStatus {
        let id = std::process::id();
        RationStatus {
            build: BuildInfo::current(),
            planning_service: PlanningServiceStatus {
                api_base_url: self.api_base_url.clone(),
                unit_table: self.unit_table,
            },
            process: ProcessStatus {
                id,
                started_at: self.started_at.to_rfc3339(),
                uptime_seconds: self.start_time.elapsed().as_secs(),
                memory_usage_bytes: process_memory(id),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_configuration() {
        let tracker = StatusTracker::new("http://localhost:8080".to_string(), &UnitTable::builtin());
        let status = tracker.get_status();
        assert_eq!(status.planning_service.api_base_url, "http://localhost:8080");
        assert_eq!(status.planning_service.unit_table.source, UnitTableSource::Builtin);
        assert_eq!(status.planning_service.unit_table.count, 3);
        assert_eq!(status.process.id, std::process::id());
        assert_eq!(status.build.version, env!("CARGO_PKG_VERSION"));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["planning_service"]["unit_table"]["source"], "builtin");
        assert_eq!(json["build"]["name"], "ration");
    }
}
