//! Fare formula applied to both individual legs and the shared route.

use serde::{Deserialize, Serialize};

const DEFAULT_BASE_PRICE: f64 = 0.90;
const DEFAULT_PER_KM_RATE: f64 = 0.60;
const DEFAULT_PER_MINUTE_RATE: f64 = 0.15;
const CENT_SNAP: f64 = 1e6;

/// Linear fare: `base_price + km * per_km_rate + minutes * per_minute_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FareTable {
    pub base_price: f64,
    pub per_km_rate: f64,
    pub per_minute_rate: f64,
}

impl Default for FareTable {
    fn default() -> Self {
        Self {
            base_price: DEFAULT_BASE_PRICE,
            per_km_rate: DEFAULT_PER_KM_RATE,
            per_minute_rate: DEFAULT_PER_MINUTE_RATE,
        }
    }
}

impl FareTable {
    /// Price rounded to cents.
    pub fn price(&self, distance_km: f64, duration_minutes: u32) -> f64 {
        round2(
            self.base_price
                + distance_km * self.per_km_rate
                + f64::from(duration_minutes) * self.per_minute_rate,
        )
    }
}

/// Rounds to 2 decimals, halves away from zero.
///
/// Cents are snapped to 1e-6 first so a half stored just below its binary
/// value (1.275 as 1.27499...) still rounds up.
pub fn round2(value: f64) -> f64 {
    let cents = (value * 100.0 * CENT_SNAP).round() / CENT_SNAP;
    cents.round() / 100.0
}
