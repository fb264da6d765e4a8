//! Transaction loading and RFM feature computation using Polars

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;

/// Reference date for recency when none is supplied (end of the
/// online-retail dataset)
pub const DEFAULT_REFERENCE_DATE: &str = "2011-12-09T00:00:00Z";

/// Per-customer RFM feature vector, read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRecord {
    /// Customer identifier, never empty
    pub customer_id: String,
    /// Days since the customer's last purchase (fractional, ≥ 0)
    pub recency: f64,
    /// Number of distinct invoices (≥ 1)
    pub frequency: f64,
    /// Total spend; refund rows subtract, so the sign is unconstrained
    pub monetary: f64,
}

/// Running per-customer aggregate while scanning transaction rows.
struct CustomerAggregate {
    customer_id: String,
    last_purchase: NaiveDateTime,
    invoices: HashSet<String>,
    monetary: f64,
}

/// Load a transactions CSV and aggregate per-customer RFM records
///
/// Rows are skipped (not failed) when the customer ID is missing, the
/// invoice number marks a cancelled order (`C` prefix), or the invoice date
/// cannot be parsed. Records come back in first-seen customer order.
///
/// # Arguments
/// * `file_path` - Path to the CSV file (online-retail column layout)
/// * `reference_date` - RFC 3339 date recency is measured against
///   (default: 2011-12-09)
///
/// # Returns
/// * Per-customer `RfmRecord`s, erroring when nothing usable survives
pub fn load_records(file_path: &str, reference_date: Option<&str>) -> crate::Result<Vec<RfmRecord>> {
    let reference = parse_reference_date(reference_date.unwrap_or(DEFAULT_REFERENCE_DATE))?;

    let df = CsvReader::from_path(file_path)?.has_header(true).finish()?;
    if df.height() == 0 {
        anyhow::bail!("no transactions found in {file_path}");
    }

    // Cast defensively: identifiers and dates to strings, amounts to floats,
    // regardless of what the reader inferred.
    let invoice_no = df.column("InvoiceNo")?.cast(&DataType::Utf8)?;
    let invoice_no = invoice_no.utf8()?;
    let invoice_date = df.column("InvoiceDate")?.cast(&DataType::Utf8)?;
    let invoice_date = invoice_date.utf8()?;
    let quantity = df.column("Quantity")?.cast(&DataType::Float64)?;
    let quantity = quantity.f64()?;
    let unit_price = df.column("UnitPrice")?.cast(&DataType::Float64)?;
    let unit_price = unit_price.f64()?;
    let customer_id = df.column("CustomerID")?.cast(&DataType::Utf8)?;
    let customer_id = customer_id.utf8()?;

    let mut aggregates: Vec<CustomerAggregate> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for row in 0..df.height() {
        let id = match customer_id.get(row) {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };

        let invoice = invoice_no.get(row).unwrap_or("");
        if invoice.starts_with('C') {
            continue;
        }

        let Some(purchased_at) = invoice_date.get(row).and_then(parse_timestamp) else {
            continue;
        };

        // Unparseable amounts degrade to zero rather than dropping the row.
        let amount = quantity.get(row).unwrap_or(0.0) * unit_price.get(row).unwrap_or(0.0);

        match slots.get(id) {
            Some(&slot) => {
                let aggregate = &mut aggregates[slot];
                if purchased_at > aggregate.last_purchase {
                    aggregate.last_purchase = purchased_at;
                }
                aggregate.invoices.insert(invoice.to_string());
                aggregate.monetary += amount;
            }
            None => {
                slots.insert(id.to_string(), aggregates.len());
                let mut invoices = HashSet::new();
                invoices.insert(invoice.to_string());
                aggregates.push(CustomerAggregate {
                    customer_id: id.to_string(),
                    last_purchase: purchased_at,
                    invoices,
                    monetary: amount,
                });
            }
        }
    }

    let records: Vec<RfmRecord> = aggregates
        .into_iter()
        .filter_map(|aggregate| {
            let recency =
                (reference - aggregate.last_purchase).num_seconds() as f64 / 86_400.0;
            // A purchase after the reference date drops the customer.
            (recency >= 0.0).then(|| RfmRecord {
                customer_id: aggregate.customer_id,
                recency,
                frequency: aggregate.invoices.len() as f64,
                monetary: aggregate.monetary,
            })
        })
        .collect();

    if records.is_empty() {
        anyhow::bail!("no valid customers found in {file_path}");
    }

    Ok(records)
}

fn parse_reference_date(raw: &str) -> crate::Result<NaiveDateTime> {
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    Ok(parsed.with_timezone(&Utc).naive_utc())
}

/// Parse an invoice timestamp, trying RFC 3339 first and then the plain
/// formats that appear in exported retail data.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }

    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country").unwrap();
        writeln!(file, "536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,2010-12-01T08:26:00,2.55,17850,United Kingdom").unwrap();
        writeln!(file, "536365,71053,WHITE METAL LANTERN,6,2010-12-01T08:26:00,3.39,17850,United Kingdom").unwrap();
        writeln!(file, "536366,22633,HAND WARMER UNION JACK,6,2011-11-01T08:28:00,1.85,17850,United Kingdom").unwrap();
        writeln!(file, "536367,84406B,CREAM CUPID HEARTS COAT HANGER,8,2010-12-01T08:34:00,2.75,13047,United Kingdom").unwrap();
        file
    }

    #[test]
    fn test_load_records() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let records = load_records(file_path, Some("2011-12-09T00:00:00Z")).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_id, "17850");
        assert_eq!(records[1].customer_id, "13047");
    }

    #[test]
    fn test_rfm_aggregation() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let records = load_records(file_path, Some("2011-12-09T00:00:00Z")).unwrap();

        let first = &records[0];
        // Two distinct invoices, last purchase 2011-11-01T08:28:00.
        assert_eq!(first.frequency, 2.0);
        assert!((first.monetary - 46.74).abs() < 1e-9);
        assert!((first.recency - 37.6472).abs() < 1e-3);

        let second = &records[1];
        assert_eq!(second.frequency, 1.0);
        assert!((second.monetary - 22.0).abs() < 1e-9);
        assert!(second.recency > 300.0);
    }

    #[test]
    fn test_skips_cancelled_and_anonymous_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country").unwrap();
        writeln!(file, "536365,85123A,HOLDER,6,2010-12-01T08:26:00,2.55,17850,United Kingdom").unwrap();
        // Cancelled order: entire row ignored.
        writeln!(file, "C536379,D,Discount,-1,2010-12-01T09:41:00,27.50,99999,United Kingdom").unwrap();
        // Missing customer ID.
        writeln!(file, "536380,22961,JAM MAKING SET,12,2010-12-01T09:41:00,1.45,,United Kingdom").unwrap();
        // Unparseable date.
        writeln!(file, "536381,22961,JAM MAKING SET,12,not-a-date,1.45,17850,United Kingdom").unwrap();

        let records = load_records(file.path().to_str().unwrap(), None).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_id, "17850");
        assert_eq!(records[0].frequency, 1.0);
    }

    #[test]
    fn test_refund_rows_subtract() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country").unwrap();
        writeln!(file, "536400,85123A,HOLDER,10,2011-01-05T10:00:00,1.00,55501,United Kingdom").unwrap();
        writeln!(file, "536401,85123A,HOLDER,-4,2011-01-06T10:00:00,1.00,55501,United Kingdom").unwrap();

        let records = load_records(file.path().to_str().unwrap(), None).unwrap();

        assert_eq!(records.len(), 1);
        assert!((records[0].monetary - 6.0).abs() < 1e-9);
        assert_eq!(records[0].frequency, 2.0);
    }

    #[test]
    fn test_drops_purchases_after_reference_date() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country").unwrap();
        writeln!(file, "536402,85123A,HOLDER,1,2011-12-25T10:00:00,1.00,55502,United Kingdom").unwrap();
        writeln!(file, "536403,85123A,HOLDER,1,2011-01-05T10:00:00,1.00,55503,United Kingdom").unwrap();

        let records = load_records(file.path().to_str().unwrap(), Some("2011-12-09T00:00:00Z")).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_id, "55503");
    }

    #[test]
    fn test_no_usable_rows_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country").unwrap();
        writeln!(file, "536380,22961,JAM MAKING SET,12,2010-12-01T09:41:00,1.45,,United Kingdom").unwrap();

        let result = load_records(file.path().to_str().unwrap(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2010-12-01T08:26:00Z").is_some());
        assert!(parse_timestamp("2010-12-01T08:26:00").is_some());
        assert!(parse_timestamp("2010-12-01 08:26:00").is_some());
        assert!(parse_timestamp("12/1/2010 8:26").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
