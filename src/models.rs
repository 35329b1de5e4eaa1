//! Core data models for the analytics pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [ChartType::Bar, ChartType::Line, ChartType::Pie, ChartType::Area];
}

//
// ================= Context =================
//

/// Free-text context produced by the retrieval flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    #[serde(rename = "context")]
    pub text: String,
}

impl RetrievedContext {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

//
// ================= Table =================
//

/// A single table cell: either text or a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value.into())
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value.into())
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Number(n) => serde_json::Value::Number(n),
            CellValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Index of the first row whose width differs from the header, if any
    pub fn first_ragged_row(&self) -> Option<usize> {
        self.rows.iter().position(|row| row.len() != self.columns.len())
    }

    /// First column name that appears more than once
    pub fn duplicate_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .enumerate()
            .find(|(i, col)| self.columns[..*i].contains(col))
            .map(|(_, col)| col.as_str())
    }

    /// True when there is more than one row and every row is identical
    pub fn all_rows_identical(&self) -> bool {
        match self.rows.split_first() {
            Some((first, rest)) if !rest.is_empty() => rest.iter().all(|row| row == first),
            _ => false,
        }
    }
}

//
// ================= Analysis =================
//

/// Structured payload returned by the analysis flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub insight: String,
    pub chart_type: ChartType,
    pub suggested_visuals: Vec<ChartType>,
    pub follow_ups: Vec<String>,
    #[serde(rename = "data_table")]
    pub table: DataTable,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AnalysisResult {
    /// Make `chart_type` a member of `suggested_visuals`.
    ///
    /// Duplicates are dropped keeping first occurrence. An empty list becomes
    /// `[chart_type]`; otherwise a chart type missing from the list is
    /// replaced by the first suggestion.
    pub fn reconcile_visuals(&mut self) {
        let mut seen = Vec::with_capacity(self.suggested_visuals.len());
        for visual in self.suggested_visuals.drain(..) {
            if !seen.contains(&visual) {
                seen.push(visual);
            }
        }
        self.suggested_visuals = seen;

        match self.suggested_visuals.first() {
            None => self.suggested_visuals.push(self.chart_type),
            Some(first) if !self.suggested_visuals.contains(&self.chart_type) => {
                self.chart_type = *first;
            }
            Some(_) => {}
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.estimated.unwrap_or(false)
    }
}

//
// ================= Final Result =================
//

/// Discriminated orchestrator result: `{"data": ...}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionResponse {
    Data(AnalysisResult),
    Error(String),
}

impl ActionResponse {
    pub fn data(&self) -> Option<&AnalysisResult> {
        match self {
            ActionResponse::Data(result) => Some(result),
            ActionResponse::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ActionResponse::Data(_) => None,
            ActionResponse::Error(message) => Some(message),
        }
    }
}

//
// ================= Query Helpers =================
//

pub const EXAMPLE_QUERIES: &[&str] = &[
    "iPhone sales in India 2023",
    "Compare Apple vs Samsung revenue in Asia 2024",
    "Top phone brands in Q1 2024 by revenue in USA",
    "EV vehicle growth in Germany between 2021 and 2024",
];

pub const TIMEFRAME_OPTIONS: &[&str] = &[
    "3 months", "6 months", "9 months", "1 year", "2 years", "5 years",
];

/// Narrow a previous query to a trailing timeframe
pub fn refine_with_timeframe(query: &str, timeframe: &str) -> String {
    format!("{} for the last {}", query, timeframe)
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(chart_type: ChartType, suggested: Vec<ChartType>) -> AnalysisResult {
        AnalysisResult {
            summary: "s".into(),
            insight: "i".into(),
            chart_type,
            suggested_visuals: suggested,
            follow_ups: vec![],
            table: DataTable {
                columns: vec!["Brand".into(), "Units".into()],
                rows: vec![vec!["Apple".into(), 10.into()]],
            },
            sources: vec![],
            estimated: None,
            confidence: None,
            note: None,
        }
    }

    #[test]
    fn test_action_response_shape() {
        let err = ActionResponse::Error("Query cannot be empty.".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Query cannot be empty." }));

        let ok = ActionResponse::Data(sample_result(ChartType::Bar, vec![ChartType::Bar]));
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("data").is_some());
        assert_eq!(json["data"]["chart_type"], "bar");
        assert_eq!(json["data"]["data_table"]["rows"][0][1], 10);
        assert!(json["data"].get("estimated").is_none());
    }

    #[test]
    fn test_reconcile_visuals() {
        let mut r = sample_result(ChartType::Pie, vec![ChartType::Line, ChartType::Bar, ChartType::Line]);
        r.reconcile_visuals();
        assert_eq!(r.suggested_visuals, vec![ChartType::Line, ChartType::Bar]);
        assert_eq!(r.chart_type, ChartType::Line);

        let mut r = sample_result(ChartType::Area, vec![]);
        r.reconcile_visuals();
        assert_eq!(r.suggested_visuals, vec![ChartType::Area]);
        assert_eq!(r.chart_type, ChartType::Area);

        let mut r = sample_result(ChartType::Bar, vec![ChartType::Pie, ChartType::Bar]);
        r.reconcile_visuals();
        assert_eq!(r.chart_type, ChartType::Bar);
    }

    #[test]
    fn test_table_checks() {
        let mut table = DataTable {
            columns: vec!["Year".into(), "Units".into()],
            rows: vec![vec![2022.into(), 5.into()], vec![2023.into(), 5.into()]],
        };
        assert_eq!(table.first_ragged_row(), None);
        assert!(!table.all_rows_identical());

        table.rows.push(vec![2024.into()]);
        assert_eq!(table.first_ragged_row(), Some(2));

        let dup = DataTable {
            columns: vec!["A".into(), "B".into(), "A".into()],
            rows: vec![],
        };
        assert_eq!(dup.duplicate_column(), Some("A"));
    }

    #[test]
    fn test_cell_value_keeps_number_format() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"["Apple", 2023, 1.5]"#).unwrap();
        assert!(cells[0].is_text());
        assert_eq!(cells[1].to_string(), "2023");
        assert_eq!(cells[2].to_string(), "1.5");
    }

    #[test]
    fn test_refine_with_timeframe() {
        assert_eq!(
            refine_with_timeframe("iPhone sales in India", TIMEFRAME_OPTIONS[3]),
            "iPhone sales in India for the last 1 year"
        );
    }
}
