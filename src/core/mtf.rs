use super::deeming::deemed_income;
use super::error::SimError;
use super::types::PersonStatus;

// Means-tested care fee thresholds and rates, as at 1 Jul 2025.
pub const ANNUAL_CAP: f64 = 32_718.57;
pub const LIFETIME_CAP: f64 = 78_524.69;
pub const MAX_ACCOMMODATION_SUPPLEMENT: f64 = 70.94; // per day

/// Former home value counted toward the asset test while still owned.
pub const PROTECTED_HOME_CAP: f64 = 210_555.0;

const INCOME_FREE_AREA_SINGLE: f64 = 34_005.40;
const INCOME_FREE_AREA_COUPLE: f64 = 25_984.40; // per person in a couple
const INCOME_TIER_CAP: f64 = 27_611.65;

const ASSET_TIER_ONE_FLOOR: f64 = 61_500.0;
const ASSET_TIER_TWO_FLOOR: f64 = 206_663.20;
const ASSET_TIER_THREE_FLOOR: f64 = 496_989.60;

/// Annual income-tested contribution: 50% of the excess over the free area
/// up to the first tier cap, then 25% on any remainder.
pub fn income_tested_contribution(income: f64, status: PersonStatus) -> f64 {
    let free_area = match status {
        PersonStatus::Single => INCOME_FREE_AREA_SINGLE,
        PersonStatus::Couple => INCOME_FREE_AREA_COUPLE,
    };

    let excess = (income - free_area).max(0.0);
    let tier_one = excess.min(INCOME_TIER_CAP);
    0.50 * tier_one + 0.25 * (excess - tier_one)
}

/// Annual asset-tested contribution over three cumulative tiers. Each rate
/// applies only to the excess within its own band.
pub fn asset_tested_contribution(assets: f64) -> f64 {
    let mut contribution = 0.0;

    if assets > ASSET_TIER_ONE_FLOOR {
        contribution += 0.175 * (assets.min(ASSET_TIER_TWO_FLOOR) - ASSET_TIER_ONE_FLOOR);
    }
    if assets > ASSET_TIER_TWO_FLOOR {
        contribution += 0.01 * (assets.min(ASSET_TIER_THREE_FLOOR) - ASSET_TIER_TWO_FLOOR);
    }
    if assets > ASSET_TIER_THREE_FLOOR {
        contribution += 0.02 * (assets - ASSET_TIER_THREE_FLOOR);
    }

    contribution
}

/// Combined annual contribution, capped at the lifetime headroom remaining.
pub fn annual_means_tested_contribution(
    annual_income: f64,
    assets: f64,
    already_paid: f64,
) -> f64 {
    let combined = income_tested_contribution(annual_income, PersonStatus::Single)
        + asset_tested_contribution(assets);
    combined.min((LIFETIME_CAP - already_paid).max(0.0))
}

/// Daily means-tested care fee for a single person.
///
/// `income_ex_deemed` is annual assessable income excluding deemed income;
/// deeming is applied here on `assets_ex_home` plus the protected home value
/// (capped, counted only while `homeowner`). The combined contribution is
/// converted to a daily figure and offset by the maximum accommodation
/// supplement, flooring at zero.
pub fn calculate_mtf_daily(
    income_ex_deemed: f64,
    assets_ex_home: f64,
    homeowner: bool,
    home_value: f64,
) -> Result<f64, SimError> {
    let protected_home = if homeowner {
        home_value.min(PROTECTED_HOME_CAP)
    } else {
        0.0
    };
    let assessable_assets = assets_ex_home + protected_home;

    let deemed = deemed_income(assessable_assets, PersonStatus::Single)?;
    let annual = annual_means_tested_contribution(
        income_ex_deemed + deemed.total_income,
        assessable_assets,
        0.0,
    );

    Ok((annual / 365.0 - MAX_ACCOMMODATION_SUPPLEMENT).max(0.0))
}
