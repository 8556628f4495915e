use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::core::MonthlyRecord;

/// Column order for both file forms; matches the field order of
/// `MonthlyRecord`.
pub const FIELD_NAMES: [&str; 12] = [
    "month",
    "year",
    "assets",
    "interest_income",
    "pension_income",
    "fees_total",
    "dap_fee",
    "mtf",
    "annual_mtf_paid",
    "lifetime_means_paid",
    "house_contribution",
    "rad_paid",
];

const SHEET_NAME: &str = "AgedCare Simulation";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet serialization failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("file write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes records as delimited text: one header row of field names, one
/// row per record.
pub fn csv_bytes(records: &[MonthlyRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

pub fn write_csv(path: &Path, records: &[MonthlyRecord]) -> Result<(), ExportError> {
    let bytes = csv_bytes(records)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Serializes records as a single-sheet workbook with the same layout as the
/// CSV form.
pub fn xlsx_bytes(records: &[MonthlyRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in FIELD_NAMES.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, record.month as f64)?;
        sheet.write_number(row, 1, record.year as f64)?;
        sheet.write_number(row, 2, record.assets)?;
        sheet.write_number(row, 3, record.interest_income)?;
        sheet.write_number(row, 4, record.pension_income)?;
        sheet.write_number(row, 5, record.fees_total)?;
        sheet.write_number(row, 6, record.dap_fee)?;
        sheet.write_number(row, 7, record.mtf)?;
        sheet.write_number(row, 8, record.annual_mtf_paid)?;
        sheet.write_number(row, 9, record.lifetime_means_paid)?;
        sheet.write_number(row, 10, record.house_contribution)?;
        sheet.write_number(row, 11, record.rad_paid)?;
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx(path: &Path, records: &[MonthlyRecord]) -> Result<(), ExportError> {
    let bytes = xlsx_bytes(records)?;
    fs::write(path, bytes)?;
    Ok(())
}
