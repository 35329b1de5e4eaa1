//! CSV export of the result table

use crate::error::AnalyticsError;
use crate::models::DataTable;
use crate::Result;

pub const CSV_FILE_NAME: &str = "analytica_data.csv";

/// Header line plus one line per row; cells needing it are quoted
pub fn table_to_csv(table: &DataTable) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyticsError::Unknown(format!("CSV flush failed: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AnalyticsError::Unknown(format!("CSV is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_to_csv() {
        let table = DataTable {
            columns: vec!["Brand".into(), "Units".into()],
            rows: vec![
                vec!["Apple".into(), 10.into()],
                vec!["Samsung".into(), 12.into()],
            ],
        };

        assert_eq!(table_to_csv(&table).unwrap(), "Brand,Units\nApple,10\nSamsung,12\n");
    }

    #[test]
    fn test_quoting() {
        let table = DataTable {
            columns: vec!["Company".into(), "Comment".into()],
            rows: vec![vec!["Apple, Inc.".into(), "Said \"record\" quarter".into()]],
        };

        let csv = table_to_csv(&table).unwrap();
        assert_eq!(
            csv,
            "Company,Comment\n\"Apple, Inc.\",\"Said \"\"record\"\" quarter\"\n"
        );
    }

    #[test]
    fn test_header_only() {
        let table = DataTable {
            columns: vec!["Year".into(), "Units".into()],
            rows: vec![],
        };
        assert_eq!(table_to_csv(&table).unwrap(), "Year,Units\n");
    }
}
