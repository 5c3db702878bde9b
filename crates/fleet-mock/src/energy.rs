use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::round_to;

/// Longest history served in one call (31 days).
pub const MAX_ENERGY_HOURS: u32 = 24 * 31;

const BASE_OUTPUT_MWH: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyOutput {
    pub timestamp: DateTime<Utc>,
    /// MWh
    pub value: f64,
}

/// Hourly output for the `hours` hours ending at `now`, oldest first.
pub fn energy_output<R: Rng>(rng: &mut R, hours: u32, now: DateTime<Utc>) -> Vec<EnergyOutput> {
    let hours = hours.min(MAX_ENERGY_HOURS);

    (0..hours)
        .map(|i| {
            let timestamp = now - Duration::hours(i64::from(hours - i - 1));
            let noise = rng.random_range(0.9..=1.1);
            EnergyOutput {
                timestamp,
                value: round_to(BASE_OUTPUT_MWH * daily_multiplier(timestamp.hour()) * noise, 2),
            }
        })
        .collect()
}

// Daylight ramps up to noon and back down by 18:00.
fn daily_multiplier(hour: u32) -> f64 {
    if (6..=18).contains(&hour) {
        let ramp = if hour <= 12 {
            f64::from(hour - 6) / 6.0
        } else {
            f64::from(18 - hour) / 6.0
        };
        1.5 + 0.5 * ramp
    } else {
        0.7
    }
}
