mod deeming;
mod engine;
mod error;
mod mtf;
mod pension;
mod types;

pub use deeming::deemed_income;
pub use engine::run;
pub use error::SimError;
pub use mtf::{ANNUAL_CAP, LIFETIME_CAP, MAX_ACCOMMODATION_SUPPLEMENT, calculate_mtf_daily};
pub use pension::calculate_age_pension;
pub use types::{
    DeemedIncome, MAX_TOTAL_MONTHS, MonthlyRecord, PersonStatus, SimulationParameters,
};
