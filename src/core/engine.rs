use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

use super::deeming::deemed_income;
use super::error::SimError;
use super::mtf::{ANNUAL_CAP, calculate_mtf_daily};
use super::pension::calculate_age_pension;
use super::types::{MonthlyRecord, PersonStatus, SimulationParameters};

/// Day-count convention for the basic and special daily fees.
const FEE_DAYS_PER_MONTH: f64 = 30.44;
/// Day-count convention for the means-tested fee.
const MTF_DAYS_PER_MONTH: f64 = 30.0;

/// Timeline phase relative to the house-sale liquidity event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    PreSale,
    PostSale,
}

/// Running state owned by a single run. One instance per run; the per-year
/// cap map and the balance are never shared across runs.
#[derive(Debug)]
struct SimulationState {
    assets: f64,
    lifetime_means_paid: f64,
    /// Calendar year -> MTF charged in that year. Keys accumulate as years
    /// are encountered and are never removed.
    year_mtf_totals: HashMap<i32, f64>,
}

impl SimulationState {
    fn new(initial_assets: f64) -> Self {
        Self {
            assets: initial_assets,
            lifetime_means_paid: 0.0,
            year_mtf_totals: HashMap::new(),
        }
    }

    fn year_paid(&self, year: i32) -> f64 {
        self.year_mtf_totals.get(&year).copied().unwrap_or(0.0)
    }
}

/// Runs the full simulation: `months_till_house_sale` pre-sale months, a
/// single accommodation-deposit settlement at the transition, then
/// `total_months_after_sale` post-sale months with the house proceeds
/// applied in the first of them.
///
/// Deterministic for fixed parameters. Validation happens before any month
/// is processed, so a failed run produces zero records.
pub fn run(params: &SimulationParameters) -> Result<Vec<MonthlyRecord>, SimError> {
    params.validate()?;

    let mut state = SimulationState::new(params.initial_assets);
    let total_months = params.months_till_house_sale + params.total_months_after_sale;
    let mut records = Vec::with_capacity(total_months as usize);

    for m in 0..params.months_till_house_sale {
        records.push(apply_month(params, &mut state, Phase::PreSale, m, 0.0)?);
    }

    // The deposit is settled in full at the transition, not amortized.
    state.assets -= params.rad;
    debug!(
        month = params.months_till_house_sale + 1,
        assets = state.assets,
        "accommodation deposit settled, entering post-sale phase"
    );

    for m in 0..params.total_months_after_sale {
        let month_idx = params.months_till_house_sale + m;
        let lump_sum = if m == 0 { params.house_value } else { 0.0 };
        records.push(apply_month(
            params,
            &mut state,
            Phase::PostSale,
            month_idx,
            lump_sum,
        )?);
    }

    Ok(records)
}

fn calendar_year(start_date: NaiveDate, elapsed_months: u32) -> Result<i32, SimError> {
    start_date
        .checked_add_months(Months::new(elapsed_months))
        .map(|date| date.year())
        .ok_or_else(|| {
            SimError::computation(format!(
                "date overflow at {elapsed_months} months from {start_date}"
            ))
        })
}

fn apply_month(
    params: &SimulationParameters,
    state: &mut SimulationState,
    phase: Phase,
    month_idx: u32,
    lump_sum: f64,
) -> Result<MonthlyRecord, SimError> {
    let year = calendar_year(params.start_date, month_idx)?;
    let homeowner = phase == Phase::PreSale;

    state.assets += lump_sum;

    let interest_income = state.assets
        * (params.asset_interest_percentage / 100.0)
        * (params.income_interest_rate / 100.0 / 12.0);
    state.assets += interest_income;

    // Means testing works on a non-negative assessable balance; a depleted
    // (negative) ledger counts as zero.
    let assessable_assets = state.assets.max(0.0);
    let deemed = deemed_income(assessable_assets, PersonStatus::Single)?;
    let pension =
        calculate_age_pension(deemed.total_income / 24.0, assessable_assets, homeowner) * 2.0;
    state.assets += pension;

    // Both caps are checked before charging; the charge is clamped to the
    // tighter remaining headroom.
    let mut mtf = 0.0;
    let year_paid = state.year_paid(year);
    if state.lifetime_means_paid < params.means_tested_lifetime_limit && year_paid < ANNUAL_CAP {
        let (mtf_assets, home_value) = match phase {
            Phase::PreSale => (assessable_assets, params.house_value),
            Phase::PostSale => ((state.assets + params.rad).max(0.0), 0.0),
        };
        let daily = calculate_mtf_daily(pension * 24.0, mtf_assets, homeowner, home_value)?;
        mtf = (daily * MTF_DAYS_PER_MONTH)
            .min(params.means_tested_lifetime_limit - state.lifetime_means_paid)
            .min(ANNUAL_CAP - year_paid);
        state.lifetime_means_paid += mtf;
        *state.year_mtf_totals.entry(year).or_insert(0.0) += mtf;
    }

    let dap_fee = match phase {
        Phase::PreSale => params.rad * (params.dap_percentage / 100.0) / 12.0,
        Phase::PostSale => 0.0,
    };
    let fees_total =
        (params.basic_daily_fee + params.special_services_fee) * FEE_DAYS_PER_MONTH + mtf + dap_fee;
    state.assets -= fees_total;

    if phase == Phase::PreSale {
        state.assets -= params.incidental_expenditure_mthly;
    }

    let rad_paid = if phase == Phase::PostSale && month_idx == params.months_till_house_sale {
        params.rad
    } else {
        0.0
    };

    Ok(MonthlyRecord {
        month: month_idx + 1,
        year,
        assets: round2(state.assets),
        interest_income: round2(interest_income),
        pension_income: round2(pension),
        fees_total: round2(fees_total),
        dap_fee: round2(dap_fee),
        mtf: round2(mtf),
        annual_mtf_paid: round2(state.year_paid(year)),
        lifetime_means_paid: round2(state.lifetime_means_paid),
        house_contribution: round2(lump_sum),
        rad_paid: round2(rad_paid),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mtf::LIFETIME_CAP;
    use std::collections::HashMap;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample_params() -> SimulationParameters {
        SimulationParameters {
            initial_assets: 140_000.0,
            rad: 750_000.0,
            house_value: 1_000_000.0,
            dap_percentage: 7.0,
            income_interest_rate: 4.0,
            asset_interest_percentage: 70.0,
            start_date: date(2025, 1, 1),
            months_till_house_sale: 6,
            total_months_after_sale: 120,
            basic_daily_fee: 63.82,
            means_tested_fee: 0.0,
            means_tested_lifetime_limit: 82_347.0,
            special_services_fee: 70.0,
            incidental_expenditure_mthly: 400.0,
        }
    }

    #[test]
    fn emits_one_record_per_month_with_continuous_indexes() {
        let records = run(&sample_params()).expect("valid run");
        assert_eq!(records.len(), 126);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.month, i as u32 + 1);
        }
    }

    #[test]
    fn house_proceeds_arrive_exactly_once_in_first_post_sale_month() {
        let params = sample_params();
        let records = run(&params).expect("valid run");

        let lump_months: Vec<u32> = records
            .iter()
            .filter(|r| r.house_contribution != 0.0)
            .map(|r| r.month)
            .collect();
        assert_eq!(lump_months, vec![7]);
        assert_approx(records[6].house_contribution, 1_000_000.0);
        assert_approx(records[6].rad_paid, 750_000.0);

        assert_approx(records[0].house_contribution, 0.0);
        assert_approx(records[0].rad_paid, 0.0);
    }

    #[test]
    fn dap_fee_charged_pre_sale_only() {
        let params = sample_params();
        let records = run(&params).expect("valid run");
        let expected_dap = 750_000.0 * 0.07 / 12.0;
        for record in &records[..6] {
            assert_approx(record.dap_fee, round2(expected_dap));
        }
        for record in &records[6..] {
            assert_approx(record.dap_fee, 0.0);
        }
    }

    #[test]
    fn lifetime_cap_never_exceeded() {
        let params = sample_params();
        let records = run(&params).expect("valid run");
        for record in &records {
            assert!(
                record.lifetime_means_paid <= params.means_tested_lifetime_limit + EPS,
                "month {} exceeded lifetime cap: {}",
                record.month,
                record.lifetime_means_paid
            );
        }
        // Monotone accumulation.
        for pair in records.windows(2) {
            assert!(pair[1].lifetime_means_paid >= pair[0].lifetime_means_paid - EPS);
        }
    }

    #[test]
    fn annual_cap_never_exceeded_in_any_calendar_year() {
        let records = run(&sample_params()).expect("valid run");
        let mut per_year: HashMap<i32, f64> = HashMap::new();
        for record in &records {
            *per_year.entry(record.year).or_insert(0.0) += record.mtf;
        }
        for (year, total) in per_year {
            assert!(
                total <= ANNUAL_CAP + 0.01,
                "year {year} charged {total} over the annual cap"
            );
        }
    }

    #[test]
    fn annual_mtf_counter_resets_at_calendar_year_boundary() {
        let mut params = sample_params();
        params.start_date = date(2025, 11, 1);
        let records = run(&params).expect("valid run");

        assert_eq!(records[0].year, 2025);
        assert_eq!(records[1].year, 2025);
        assert_eq!(records[2].year, 2026);
        // January's running annual total is exactly January's charge.
        assert_approx(records[2].annual_mtf_paid, records[2].mtf);
    }

    #[test]
    fn rerun_with_identical_parameters_is_identical() {
        let params = sample_params();
        let first = run(&params).expect("valid run");
        let second = run(&params).expect("valid run");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_lifetime_limit_means_no_mtf_ever() {
        let mut params = sample_params();
        params.means_tested_lifetime_limit = 0.0;
        let records = run(&params).expect("valid run");
        for record in &records {
            assert_approx(record.mtf, 0.0);
            assert_approx(record.lifetime_means_paid, 0.0);
        }
    }

    #[test]
    fn lifetime_limit_above_internal_cap_is_still_bounded_by_it() {
        // The per-call contribution is capped at LIFETIME_CAP per year and
        // the annual cap per calendar year, so even a generous user limit
        // accumulates slowly.
        let records = run(&sample_params()).expect("valid run");
        let first_year_total: f64 = records
            .iter()
            .filter(|r| r.year == 2025)
            .map(|r| r.mtf)
            .sum();
        assert!(first_year_total <= LIFETIME_CAP + EPS);
    }

    #[test]
    fn zero_pre_sale_months_starts_directly_post_sale() {
        let mut params = sample_params();
        params.months_till_house_sale = 0;
        let records = run(&params).expect("valid run");
        assert_eq!(records.len(), 120);
        assert_approx(records[0].house_contribution, 1_000_000.0);
        assert_approx(records[0].rad_paid, 750_000.0);
        assert_approx(records[0].dap_fee, 0.0);
    }

    #[test]
    fn rad_settlement_reported_even_when_house_value_is_zero() {
        let mut params = sample_params();
        params.house_value = 0.0;
        let records = run(&params).expect("valid run");
        assert_approx(records[6].house_contribution, 0.0);
        assert_approx(records[6].rad_paid, 750_000.0);
    }

    #[test]
    fn first_month_accounting_matches_hand_calculation() {
        let params = sample_params();
        let records = run(&params).expect("valid run");
        let first = &records[0];

        let interest = 140_000.0 * 0.70 * (0.04 / 12.0);
        assert_approx(first.interest_income, round2(interest));

        let mut assets = 140_000.0 + interest;
        let deemed = deemed_income(assets, PersonStatus::Single).unwrap();
        let pension = calculate_age_pension(deemed.total_income / 24.0, assets, true) * 2.0;
        assert_approx(first.pension_income, round2(pension));
        assets += pension;

        let daily = calculate_mtf_daily(pension * 24.0, assets, true, params.house_value).unwrap();
        let mtf = (daily * MTF_DAYS_PER_MONTH)
            .min(params.means_tested_lifetime_limit)
            .min(ANNUAL_CAP);
        assert_approx(first.mtf, round2(mtf));

        let dap_fee = 750_000.0 * 0.07 / 12.0;
        let fees = (63.82 + 70.0) * FEE_DAYS_PER_MONTH + mtf + dap_fee;
        assert_approx(first.fees_total, round2(fees));

        assets -= fees;
        assets -= 400.0;
        assert_approx(first.assets, round2(assets));
    }

    #[test]
    fn failed_validation_produces_no_records() {
        let mut params = sample_params();
        params.initial_assets = -1.0;
        let err = run(&params).expect_err("must reject");
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_post_sale_horizon() {
        let mut params = sample_params();
        params.total_months_after_sale = 0;
        assert!(matches!(
            run(&params),
            Err(SimError::Validation(msg)) if msg.contains("total_months_after_sale")
        ));
    }

    #[test]
    fn rejects_absurd_horizon() {
        let mut params = sample_params();
        params.total_months_after_sale = 20_000;
        assert!(run(&params).is_err());
    }

    #[test]
    fn rejects_out_of_range_start_date_before_any_month_is_processed() {
        // An extreme start date plus a long horizon used to surface as a
        // mid-run date-overflow computation failure; it must be rejected
        // up front as bad input instead.
        let mut params = sample_params();
        params.start_date = date(20_000, 1, 1);
        params.total_months_after_sale = 9_000;
        assert!(matches!(
            run(&params),
            Err(SimError::Validation(msg)) if msg.contains("start_date")
        ));

        let mut params = sample_params();
        params.start_date = date(1850, 1, 1);
        assert!(matches!(run(&params), Err(SimError::Validation(_))));
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let mut params = sample_params();
        params.dap_percentage = 150.0;
        assert!(run(&params).is_err());

        let mut params = sample_params();
        params.income_interest_rate = -4.0;
        assert!(run(&params).is_err());
    }

    #[test]
    fn calendar_year_follows_start_date_offset() {
        let start = date(2025, 1, 1);
        assert_eq!(calendar_year(start, 0).unwrap(), 2025);
        assert_eq!(calendar_year(start, 11).unwrap(), 2025);
        assert_eq!(calendar_year(start, 12).unwrap(), 2026);
        assert_eq!(calendar_year(start, 36).unwrap(), 2028);
    }
}
