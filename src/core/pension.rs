// Age pension rates and thresholds, single person, as at Jan 2025.
pub const MAX_PENSION_SINGLE: f64 = 1_116.30; // per fortnight, incl. supplements
pub const INCOME_FREE_AREA_SINGLE: f64 = 204.00; // per fortnight
const INCOME_TAPER: f64 = 0.50; // reduction per $1 over the free area

pub const ASSETS_THRESHOLD_HOMEOWNER_SINGLE: f64 = 314_000.0;
pub const ASSETS_THRESHOLD_NONHOMEOWNER_SINGLE: f64 = 566_000.0;
const ASSETS_TAPER: f64 = 3.00; // reduction per $1000 over the threshold

fn income_tested_pension(income: f64) -> f64 {
    if income <= INCOME_FREE_AREA_SINGLE {
        return MAX_PENSION_SINGLE;
    }
    let reduction = (income - INCOME_FREE_AREA_SINGLE) * INCOME_TAPER;
    (MAX_PENSION_SINGLE - reduction).max(0.0)
}

fn assets_tested_pension(assets: f64, homeowner: bool) -> f64 {
    let threshold = if homeowner {
        ASSETS_THRESHOLD_HOMEOWNER_SINGLE
    } else {
        ASSETS_THRESHOLD_NONHOMEOWNER_SINGLE
    };
    if assets <= threshold {
        return MAX_PENSION_SINGLE;
    }
    let reduction = (assets - threshold) / 1_000.0 * ASSETS_TAPER;
    (MAX_PENSION_SINGLE - reduction).max(0.0)
}

/// Fortnightly age pension payable under the dual means test.
///
/// `income` is assessable income per fortnight. The income test and the
/// assets test each produce a candidate pension; the binding (lower) result
/// is paid. Non-increasing in both arguments, never negative.
pub fn calculate_age_pension(income: f64, assets: f64, homeowner: bool) -> f64 {
    income_tested_pension(income).min(assets_tested_pension(assets, homeowner))
}
