use super::error::SimError;
use super::types::{DeemedIncome, PersonStatus};

// Deeming thresholds and rates, Services Australia, effective 20 Sep 2025.
pub const LOWER_THRESHOLD_SINGLE: f64 = 64_200.0;
pub const LOWER_THRESHOLD_COUPLE: f64 = 106_200.0;
pub const LOWER_DEEMING_RATE: f64 = 0.0075;
pub const UPPER_DEEMING_RATE: f64 = 0.0275;

/// Annual deemed income on financial assets under the two-tier schedule.
///
/// The portion of `assets` up to the status-dependent threshold earns the
/// lower rate; the remainder earns the upper rate. Rejects negative or
/// non-finite balances.
pub fn deemed_income(assets: f64, status: PersonStatus) -> Result<DeemedIncome, SimError> {
    if !assets.is_finite() || assets < 0.0 {
        return Err(SimError::validation(
            "deemed income requires a non-negative asset balance",
        ));
    }

    let threshold = match status {
        PersonStatus::Single => LOWER_THRESHOLD_SINGLE,
        PersonStatus::Couple => LOWER_THRESHOLD_COUPLE,
    };

    let lower_amount = assets.min(threshold);
    let upper_amount = (assets - threshold).max(0.0);
    let lower_income = lower_amount * LOWER_DEEMING_RATE;
    let upper_income = upper_amount * UPPER_DEEMING_RATE;

    Ok(DeemedIncome {
        lower_amount,
        upper_amount,
        lower_income,
        upper_income,
        total_income: lower_income + upper_income,
    })
}
