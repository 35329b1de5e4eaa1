//! Chart series derivation
//!
//! Decides which table columns feed a chart: the x-axis is the first
//! categorical column, the series are the numeric ones. Types are read from
//! the first row only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{AnalysisResult, ChartType, DataTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub available: Vec<ChartType>,
    pub x_axis_key: String,
    pub data_keys: Vec<String>,
    pub points: Vec<Map<String, Value>>,
}

impl ChartSpec {
    /// Series to draw for the active chart type; pie charts take one
    pub fn series(&self) -> &[String] {
        match self.chart_type {
            ChartType::Pie => &self.data_keys[..self.data_keys.len().min(1)],
            _ => &self.data_keys,
        }
    }

    /// Same spec rendered as a different (offered) chart type
    pub fn switch_to(&mut self, chart_type: ChartType) -> bool {
        if self.available.contains(&chart_type) {
            self.chart_type = chart_type;
            true
        } else {
            false
        }
    }
}

/// Suggestions with duplicates removed; `[bar]` when nothing is suggested
pub fn valid_visuals(suggested: &[ChartType]) -> Vec<ChartType> {
    let mut visuals = Vec::with_capacity(suggested.len());
    for visual in suggested {
        if !visuals.contains(visual) {
            visuals.push(*visual);
        }
    }
    if visuals.is_empty() {
        visuals.push(ChartType::Bar);
    }
    visuals
}

/// The recommended chart if it is on offer, otherwise the first offered one
pub fn initial_chart(chart_type: ChartType, suggested: &[ChartType]) -> ChartType {
    let visuals = valid_visuals(suggested);
    if visuals.contains(&chart_type) {
        chart_type
    } else {
        visuals[0]
    }
}

/// `None` means there is not enough data to draw a chart
pub fn build_chart_spec(result: &AnalysisResult) -> Option<ChartSpec> {
    let (x_axis_key, data_keys) = classify_columns(&result.table)?;

    let points = result
        .table
        .rows
        .iter()
        .map(|row| {
            result
                .table
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned().map(Value::from))
                .collect::<Map<String, Value>>()
        })
        .collect();

    Some(ChartSpec {
        chart_type: initial_chart(result.chart_type, &result.suggested_visuals),
        available: valid_visuals(&result.suggested_visuals),
        x_axis_key,
        data_keys,
        points,
    })
}

fn classify_columns(table: &DataTable) -> Option<(String, Vec<String>)> {
    if table.columns.len() < 2 {
        return None;
    }
    let first_row = table.rows.first()?;

    let x_index = (0..table.columns.len())
        .find(|i| first_row.get(*i).map_or(false, |cell| cell.is_text()))
        .unwrap_or(0);
    let x_axis_key = table.columns[x_index].clone();

    let numeric: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| first_row.get(*i).map_or(false, |cell| cell.is_number()))
        .map(|(_, col)| col.clone())
        .collect();

    let data_keys = if numeric.is_empty() {
        table
            .columns
            .iter()
            .filter(|col| **col != x_axis_key)
            .cloned()
            .collect()
    } else {
        numeric
    };

    if data_keys.is_empty() {
        None
    } else {
        Some((x_axis_key, data_keys))
    }
}
