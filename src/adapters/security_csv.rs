//! Security list ingestion from CSV.
//!
//! Expected header: `ticker,value` plus any of `price`, `yield_pct` (or
//! `yield`), `stability`, `sector`. Unknown columns are ignored; empty cells
//! in optional columns read as absent.

use crate::domain::error::DcaError;
use crate::domain::security::{validate_batch, SecurityRow};
use std::io::Read;
use std::path::Path;

pub fn read_securities<R: Read>(reader: R) -> Result<Vec<SecurityRow>, DcaError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize::<SecurityRow>().enumerate() {
        let mut row = result.map_err(|e| DcaError::Csv {
            reason: format!("row {}: {}", line + 1, e),
        })?;
        row.ticker = row.ticker.to_uppercase();
        rows.push(row);
    }

    validate_batch(&rows)?;
    Ok(rows)
}

pub fn read_securities_file<P: AsRef<Path>>(path: P) -> Result<Vec<SecurityRow>, DcaError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| DcaError::Csv {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;
    let rows = read_securities(file)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "read securities");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_full_rows() {
        let csv = "ticker,value,price,yield_pct,stability,sector\n\
                   bhp,48.0,45.5,5.2,0.6,Materials\n\
                   CBA,90,120,3.9,0.75,Financials\n";
        let rows = read_securities(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "BHP");
        assert_eq!(rows[0].price, Some(45.5));
        assert_eq!(rows[0].yield_pct, Some(5.2));
        assert_eq!(rows[1].stability, Some(0.75));
        assert_eq!(rows[1].sector.as_deref(), Some("Financials"));
    }

    #[test]
    fn optional_columns_may_be_missing_or_blank() {
        let csv = "ticker,value,price,yield\nWES, 60 ,55,\n";
        let rows = read_securities(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].value, 60.0);
        assert_eq!(rows[0].yield_pct, None);
        assert_eq!(rows[0].stability, None);
    }

    #[test]
    fn yield_header_alias() {
        let csv = "ticker,value,price,yield\nWES,60,55,4.1\n";
        let rows = read_securities(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].yield_pct, Some(4.1));
    }

    #[test]
    fn non_numeric_value_is_csv_error() {
        let csv = "ticker,value\nWES,lots\n";
        let err = read_securities(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DcaError::Csv { reason } if reason.starts_with("row 1")));
    }

    #[test]
    fn duplicate_tickers_rejected() {
        let csv = "ticker,value\nWES,1\nwes,2\n";
        assert!(matches!(
            read_securities(csv.as_bytes()),
            Err(DcaError::DuplicateTicker(_))
        ));
    }

    #[test]
    fn missing_file_is_csv_error() {
        assert!(matches!(
            read_securities_file("/nonexistent/securities.csv"),
            Err(DcaError::Csv { .. })
        ));
    }
}
