use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to a day's second slot when a category change finds only one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialDayPolicy {
    #[default]
    KeepExisting,
    ClearUnmatched,
}

impl FromStr for PartialDayPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "keep" | "keep_existing" | "keep-existing" => Ok(Self::KeepExisting),
            "clear" | "clear_unmatched" | "clear-unmatched" => Ok(Self::ClearUnmatched),
            other => Err(format!("unknown partial-day policy '{other}' (expected keep|clear)")),
        }
    }
}

/// How a recalled trip is rebuilt from its history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallPolicy {
    /// Re-run hotel and attraction selection from the four primary fields.
    #[default]
    Regenerate,
    /// Reuse the recorded hotel and attractions when the dataset still has them.
    Restore,
}

impl FromStr for RecallPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "regenerate" | "approximate" => Ok(Self::Regenerate),
            "restore" | "exact" => Ok(Self::Restore),
            other => Err(format!("unknown recall policy '{other}' (expected regenerate|restore)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningPolicy {
    pub hotel_budget_share: f64,
    pub misc_budget_share: f64,
    pub long_haul_threshold_km: f64,
    pub long_haul_rate_per_km: f64,
    pub short_haul_rate_per_km: f64,
    pub attractions_per_day: usize,
    pub default_duration_days: u32,
    pub max_duration_days: u32,
    pub partial_day: PartialDayPolicy,
    pub recall: RecallPolicy,
}

impl Default for PlanningPolicy {
    fn default() -> Self {
        Self {
            hotel_budget_share: 0.60,
            misc_budget_share: 0.15,
            long_haul_threshold_km: 3000.0,
            long_haul_rate_per_km: 0.08,
            short_haul_rate_per_km: 0.12,
            attractions_per_day: 2,
            default_duration_days: 3,
            max_duration_days: 365,
            partial_day: PartialDayPolicy::default(),
            recall: RecallPolicy::default(),
        }
    }
}

impl PlanningPolicy {
    pub fn rate_for(&self, distance_km: f64) -> f64 {
        if distance_km > self.long_haul_threshold_km {
            self.long_haul_rate_per_km
        } else {
            self.short_haul_rate_per_km
        }
    }

    /// Zero is treated as "not given". Lengths are never shortened here; the planner
    /// rejects anything above `max_duration_days`.
    pub fn normalize_duration(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(days) if days >= 1 => days,
            _ => self.default_duration_days.max(1),
        }
    }

    pub fn allows_duration(&self, days: u32) -> bool {
        days <= self.max_duration_days
    }

    pub fn slot_count(&self, duration: u32) -> usize {
        self.attractions_per_day * duration as usize
    }
}
