//! Cleaning rules for the Telco churn layout.

use super::error::DatasetError;
use super::table::RawTable;
use super::value::RawValue;

/// Identifier column dropped before training.
pub const ID_COLUMN: &str = "customerID";
/// Charges column that arrives as text with blanks for new customers.
pub const TOTAL_CHARGES_COLUMN: &str = "TotalCharges";
pub const MONTHLY_CHARGES_COLUMN: &str = "MonthlyCharges";
pub const TENURE_COLUMN: &str = "tenure";
/// Binary target column (`Yes`/`No`).
pub const TARGET_COLUMN: &str = "Churn";

/// What [`clean`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub dropped_id: bool,
    /// Cells of the charges column that were blank or non-numeric.
    pub coerced_missing: usize,
    pub imputed_from_product: usize,
    pub imputed_from_median: usize,
}

/// Drop the identifier and repair the charges column in place.
///
/// Missing charges become `MonthlyCharges * tenure` when both are numeric,
/// otherwise the column median.
pub fn clean(table: &mut RawTable) -> CleaningReport {
    let mut report = CleaningReport {
        dropped_id: table.remove_column(ID_COLUMN).is_some(),
        ..CleaningReport::default()
    };

    let Some(charges) = table.column_index(TOTAL_CHARGES_COLUMN) else {
        return report;
    };

    let mut missing_rows = Vec::new();
    for row in 0..table.len() {
        let coerced = table.cell(row, charges).as_number();
        match coerced {
            Some(value) => table.set_cell(row, charges, RawValue::Number(value)),
            None => {
                table.set_cell(row, charges, RawValue::Missing);
                missing_rows.push(row);
            }
        }
    }
    report.coerced_missing = missing_rows.len();
    if missing_rows.is_empty() {
        return report;
    }

    let monthly = table.column_index(MONTHLY_CHARGES_COLUMN);
    let tenure = table.column_index(TENURE_COLUMN);
    if let (Some(monthly), Some(tenure)) = (monthly, tenure) {
        for &row in &missing_rows {
            let product = match (table.cell(row, monthly), table.cell(row, tenure)) {
                (RawValue::Number(rate), RawValue::Number(months)) => Some(rate * months),
                _ => None,
            };
            if let Some(value) = product {
                table.set_cell(row, charges, RawValue::Number(value));
                report.imputed_from_product += 1;
            }
        }
    }

    let present: Vec<f64> = table.column(charges).filter_map(RawValue::as_number).collect();
    if let Some(median) = median(present) {
        for &row in &missing_rows {
            if table.cell(row, charges).is_missing() {
                table.set_cell(row, charges, RawValue::Number(median));
                report.imputed_from_median += 1;
            }
        }
    }
    report
}

/// Remove the target column and map `Yes`/`No` to `1`/`0`.
pub fn extract_target(table: &mut RawTable) -> Result<Vec<u8>, DatasetError> {
    let cells = table
        .remove_column(TARGET_COLUMN)
        .ok_or_else(|| DatasetError::MissingColumn {
            column: TARGET_COLUMN.to_string(),
        })?;
    cells
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| match &cell {
            RawValue::Text(text) if text.trim() == "Yes" => Ok(1),
            RawValue::Text(text) if text.trim() == "No" => Ok(0),
            other => Err(DatasetError::InvalidTarget {
                row: idx + 1,
                value: other.to_string(),
            }),
        })
        .collect()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
