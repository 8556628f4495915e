use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::SimError;

/// Means-testing status of the care recipient.
///
/// Couple rates exist in the deeming and MTF schedules but the engine only
/// simulates a single person.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PersonStatus {
    Single,
    Couple,
}

/// Immutable inputs for one simulation run.
///
/// Monetary amounts are dollars, rates are percentages expressed as 0-100
/// floats. `start_date` anchors the calendar-year tracking used by the
/// annual means-tested fee cap.
#[derive(Debug, Clone)]
pub struct SimulationParameters {
    pub initial_assets: f64,
    pub rad: f64,
    pub house_value: f64,
    pub dap_percentage: f64,
    pub income_interest_rate: f64,
    pub asset_interest_percentage: f64,
    pub start_date: NaiveDate,
    pub months_till_house_sale: u32,
    pub total_months_after_sale: u32,
    pub basic_daily_fee: f64,
    /// Fixed daily MTF from the deprecated flat-fee schedule. Retained for
    /// input compatibility; the engine always computes the fee instead.
    pub means_tested_fee: f64,
    pub means_tested_lifetime_limit: f64,
    pub special_services_fee: f64,
    pub incidental_expenditure_mthly: f64,
}

/// Longest horizon a run may cover, pre- plus post-sale months.
pub const MAX_TOTAL_MONTHS: u32 = 10_000;

/// Accepted `start_date` year range. The upper bound plus the longest
/// horizon stays well inside chrono's calendar range, so month arithmetic
/// cannot overflow once validation has passed.
pub const MIN_START_YEAR: i32 = 1900;
pub const MAX_START_YEAR: i32 = 9999;

impl SimulationParameters {
    /// Checks every field is in-domain. Called once by the engine before any
    /// month is processed, so a failed run emits zero records.
    pub fn validate(&self) -> Result<(), SimError> {
        let money = [
            ("initial_assets", self.initial_assets),
            ("rad", self.rad),
            ("house_value", self.house_value),
            ("basic_daily_fee", self.basic_daily_fee),
            ("means_tested_fee", self.means_tested_fee),
            (
                "means_tested_lifetime_limit",
                self.means_tested_lifetime_limit,
            ),
            ("special_services_fee", self.special_services_fee),
            (
                "incidental_expenditure_mthly",
                self.incidental_expenditure_mthly,
            ),
        ];
        for (name, value) in money {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::validation(format!(
                    "{name} must be a non-negative amount"
                )));
            }
        }

        let rates = [
            ("dap_percentage", self.dap_percentage),
            ("income_interest_rate", self.income_interest_rate),
            ("asset_interest_percentage", self.asset_interest_percentage),
        ];
        for (name, value) in rates {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(SimError::validation(format!(
                    "{name} must be between 0 and 100"
                )));
            }
        }

        let year = self.start_date.year();
        if !(MIN_START_YEAR..=MAX_START_YEAR).contains(&year) {
            return Err(SimError::validation(format!(
                "start_date year must be between {MIN_START_YEAR} and {MAX_START_YEAR}"
            )));
        }

        if self.total_months_after_sale < 1 {
            return Err(SimError::validation(
                "total_months_after_sale must be >= 1",
            ));
        }

        let total = self
            .months_till_house_sale
            .checked_add(self.total_months_after_sale)
            .unwrap_or(u32::MAX);
        if total > MAX_TOTAL_MONTHS {
            return Err(SimError::validation(format!(
                "simulation horizon of {total} months exceeds the {MAX_TOTAL_MONTHS}-month limit"
            )));
        }

        Ok(())
    }
}

/// Breakdown of deemed income on a financial asset balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeemedIncome {
    /// Portion of the balance at or below the deeming threshold.
    pub lower_amount: f64,
    /// Portion of the balance above the threshold.
    pub upper_amount: f64,
    pub lower_income: f64,
    pub upper_income: f64,
    /// Annual deemed income, `lower_income + upper_income` exactly.
    pub total_income: f64,
}

/// One emitted row per simulated month. Field order is the CSV/XLSX column
/// order. Every amount is rounded to 2 decimal places on emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecord {
    /// 1-based month index, continuous across both phases.
    pub month: u32,
    pub year: i32,
    /// Asset balance after this month's income and fees.
    pub assets: f64,
    pub interest_income: f64,
    pub pension_income: f64,
    pub fees_total: f64,
    pub dap_fee: f64,
    /// Means-tested fee actually charged this month after cap clamping.
    pub mtf: f64,
    pub annual_mtf_paid: f64,
    pub lifetime_means_paid: f64,
    /// Lump-sum proceeds applied this month; house value in the first
    /// post-sale month, zero otherwise.
    pub house_contribution: f64,
    /// Accommodation deposit settled this month; reported in the first
    /// post-sale month, zero otherwise.
    pub rad_paid: f64,
}
