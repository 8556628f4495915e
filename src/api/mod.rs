use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{MonthlyRecord, SimError, SimulationParameters, run};
use crate::export;

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "agedcare",
    about = "Aged care financial simulator: projects assets, pension and means-tested fees month by month"
)]
struct Cli {
    #[arg(long, help = "Initial financial assets ($)")]
    initial_assets: f64,
    #[arg(long, help = "Refundable Accommodation Deposit ($)")]
    rad: f64,
    #[arg(long, value_parser = parse_start_date, help = "Simulation start date, YYYY-MM-DD")]
    start_date: NaiveDate,
    #[arg(long, help = "Value of house to be sold later ($)")]
    house_value: f64,
    #[arg(long, help = "Annual DAP percentage on the RAD (e.g. 7 for 7%)")]
    dap_percentage: f64,
    #[arg(long, help = "Annual income interest rate on assets (%)")]
    income_interest_rate: f64,
    #[arg(long, help = "Percentage of the asset pool earning interest")]
    asset_interest_percentage: f64,
    #[arg(long, help = "Months until the house is sold")]
    months_till_house_sale: u32,
    #[arg(long, help = "Months to simulate after the house sale")]
    total_months_after_sale: u32,
    #[arg(long, help = "Basic daily care fee ($/day)")]
    basic_daily_fee: f64,
    #[arg(long, help = "Fixed means tested fee ($/day, legacy; the fee is calculated)")]
    means_tested_fee: f64,
    #[arg(long, help = "Lifetime cap for means tested fees ($)")]
    means_tested_lifetime_limit: f64,
    #[arg(long, help = "Special services fee ($/day)")]
    special_services_fee: f64,
    #[arg(long, help = "Monthly outgoing living expenses ($)")]
    incidental_expenditure_mthly: f64,
    #[arg(long, help = "Write results to this CSV file")]
    csv: Option<PathBuf>,
    #[arg(long, help = "Write results to this Excel file")]
    excel: Option<PathBuf>,
}

fn parse_start_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Not a valid date: '{s}'. Expected format: YYYY-MM-DD."))
}

fn build_params(cli: &Cli) -> Result<SimulationParameters, String> {
    let params = SimulationParameters {
        initial_assets: cli.initial_assets,
        rad: cli.rad,
        house_value: cli.house_value,
        dap_percentage: cli.dap_percentage,
        income_interest_rate: cli.income_interest_rate,
        asset_interest_percentage: cli.asset_interest_percentage,
        start_date: cli.start_date,
        months_till_house_sale: cli.months_till_house_sale,
        total_months_after_sale: cli.total_months_after_sale,
        basic_daily_fee: cli.basic_daily_fee,
        means_tested_fee: cli.means_tested_fee,
        means_tested_lifetime_limit: cli.means_tested_lifetime_limit,
        special_services_fee: cli.special_services_fee,
        incidental_expenditure_mthly: cli.incidental_expenditure_mthly,
    };
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

/// Parses command-line flags, runs the simulation, prints a tabular preview
/// and writes any requested output files.
pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let params = build_params(&cli)?;

    info!(
        months = params.months_till_house_sale + params.total_months_after_sale,
        start = %params.start_date,
        "starting simulation"
    );
    let records = run(&params).map_err(|e| e.to_string())?;
    print_table(&params, &records);

    if let Some(path) = &cli.csv {
        export::write_csv(path, &records).map_err(|e| e.to_string())?;
        info!(path = %path.display(), "saved CSV results");
        println!("Saved results to {}", path.display());
    }
    if let Some(path) = &cli.excel {
        export::write_xlsx(path, &records).map_err(|e| e.to_string())?;
        info!(path = %path.display(), "saved Excel results");
        println!("Saved results to {}", path.display());
    }

    Ok(())
}

fn print_table(params: &SimulationParameters, records: &[MonthlyRecord]) {
    println!(
        "Month |  Year |       Assets |  Interest |  Pension | Fees(total) |  DAP fee |      MTF | Annual MTF | Lifetime MTF | House Contrib |   RAD Paid"
    );
    println!(
        "{:>5} | {:>5} | {:>12.2} | {:>9.2} | {:>8.2} | {:>11.2} | {:>8.2} | {:>8.2} | {:>10.2} | {:>12.2} | {:>13.2} | {:>10.2}",
        0, "-", params.initial_assets, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0
    );
    for r in records {
        println!(
            "{:>5} | {:>5} | {:>12.2} | {:>9.2} | {:>8.2} | {:>11.2} | {:>8.2} | {:>8.2} | {:>10.2} | {:>12.2} | {:>13.2} | {:>10.2}",
            r.month,
            r.year,
            r.assets,
            r.interest_income,
            r.pension_income,
            r.fees_total,
            r.dap_fee,
            r.mtf,
            r.annual_mtf_paid,
            r.lifetime_means_paid,
            r.house_contribution,
            r.rad_paid
        );
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_assets: Option<f64>,
    rad: Option<f64>,
    start_date: Option<String>,
    house_value: Option<f64>,
    dap_percentage: Option<f64>,
    income_interest_rate: Option<f64>,
    asset_interest_percentage: Option<f64>,
    months_till_house_sale: Option<u32>,
    total_months_after_sale: Option<u32>,
    basic_daily_fee: Option<f64>,
    means_tested_fee: Option<f64>,
    means_tested_lifetime_limit: Option<f64>,
    special_services_fee: Option<f64>,
    incidental_expenditure_mthly: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    months: usize,
    final_assets: f64,
    records: Vec<MonthlyRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn api_params_from_payload(payload: SimulatePayload) -> Result<SimulationParameters, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_assets {
        cli.initial_assets = v;
    }
    if let Some(v) = payload.rad {
        cli.rad = v;
    }
    if let Some(v) = payload.start_date {
        cli.start_date = parse_start_date(&v)?;
    }
    if let Some(v) = payload.house_value {
        cli.house_value = v;
    }
    if let Some(v) = payload.dap_percentage {
        cli.dap_percentage = v;
    }
    if let Some(v) = payload.income_interest_rate {
        cli.income_interest_rate = v;
    }
    if let Some(v) = payload.asset_interest_percentage {
        cli.asset_interest_percentage = v;
    }
    if let Some(v) = payload.months_till_house_sale {
        cli.months_till_house_sale = v;
    }
    if let Some(v) = payload.total_months_after_sale {
        cli.total_months_after_sale = v;
    }
    if let Some(v) = payload.basic_daily_fee {
        cli.basic_daily_fee = v;
    }
    if let Some(v) = payload.means_tested_fee {
        cli.means_tested_fee = v;
    }
    if let Some(v) = payload.means_tested_lifetime_limit {
        cli.means_tested_lifetime_limit = v;
    }
    if let Some(v) = payload.special_services_fee {
        cli.special_services_fee = v;
    }
    if let Some(v) = payload.incidental_expenditure_mthly {
        cli.incidental_expenditure_mthly = v;
    }

    build_params(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_assets: 140_000.0,
        rad: 750_000.0,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        house_value: 1_000_000.0,
        dap_percentage: 7.0,
        income_interest_rate: 4.0,
        asset_interest_percentage: 70.0,
        months_till_house_sale: 6,
        total_months_after_sale: 120,
        basic_daily_fee: 63.82,
        means_tested_fee: 0.0,
        means_tested_lifetime_limit: 82_347.0,
        special_services_fee: 70.0,
        incidental_expenditure_mthly: 400.0,
        csv: None,
        excel: None,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/simulate/csv",
            get(csv_get_handler).post(csv_post_handler),
        )
        .route(
            "/api/simulate/xlsx",
            get(xlsx_get_handler).post(xlsx_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "aged care simulator HTTP API listening");
    println!("Aged care simulator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let records = match run_for_payload(payload) {
        Ok(records) => records,
        Err(response) => return response,
    };
    let response = SimulateResponse {
        months: records.len(),
        final_assets: records.last().map(|r| r.assets).unwrap_or(0.0),
        records,
    };
    json_response(StatusCode::OK, response)
}

async fn csv_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    csv_handler_impl(payload)
}

async fn csv_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    csv_handler_impl(payload)
}

fn csv_handler_impl(payload: SimulatePayload) -> Response {
    let records = match run_for_payload(payload) {
        Ok(records) => records,
        Err(response) => return response,
    };
    match export::csv_bytes(&records) {
        Ok(bytes) => download_response(bytes, "text/csv; charset=utf-8", "agedcare_simulation.csv"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn xlsx_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    xlsx_handler_impl(payload)
}

async fn xlsx_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    xlsx_handler_impl(payload)
}

fn xlsx_handler_impl(payload: SimulatePayload) -> Response {
    let records = match run_for_payload(payload) {
        Ok(records) => records,
        Err(response) => return response,
    };
    match export::xlsx_bytes(&records) {
        Ok(bytes) => download_response(
            bytes,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "agedcare_simulation.xlsx",
        ),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn run_for_payload(payload: SimulatePayload) -> Result<Vec<MonthlyRecord>, Response> {
    let params = api_params_from_payload(payload)
        .map_err(|msg| error_response(StatusCode::BAD_REQUEST, &msg))?;
    run(&params).map_err(|e| sim_error_response(&e))
}

/// Bad input is the client's fault; a computation failure is a defect in the
/// server and must not masquerade as one.
fn sim_error_response(error: &SimError) -> Response {
    let status = match error {
        SimError::Validation(_) => StatusCode::BAD_REQUEST,
        SimError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &error.to_string())
}

fn download_response(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    with_cache_control((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_params_from_json(json: &str) -> Result<SimulationParameters, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_params_from_payload(payload)
}
