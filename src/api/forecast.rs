use std::time::Instant;

use axum::extract::Multipart;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::data::parse_datetime;
use crate::error::{PipelineError, Result as PipelineResult};
use crate::metrics::one_step_naive_errors;
use crate::models::persistence::flat_forecast;

use super::error::ApiError;

const FORECAST_STEPS: usize = 3;

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub label: String,
    pub confidence: f64,
    #[serde(rename = "topK")]
    pub top_k: Vec<TopK>,
    pub forecast: Vec<ForecastPoint>,
    pub model: String,
    pub inference_ms: u64,
    pub timestamp: String,
    pub metrics: NaiveMetrics,
}

#[derive(Debug, Serialize)]
pub struct TopK {
    pub label: String,
    pub prob: f64,
}

#[derive(Debug, Serialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct NaiveMetrics {
    pub mae: f64,
    pub rmse: f64,
}

/// POST /forecast: upload a CSV or JSON time series and receive a
/// 3-step-ahead flat-line forecast with one-step-lag naive accuracy over
/// the uploaded series, plus fixed classification-style metadata.
pub async fn forecast(mut multipart: Multipart) -> Result<Json<ForecastResponse>, ApiError> {
    let start = Instant::now();

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| ApiError::BadRequest("missing file upload".to_string()))?;
    let filename = field.file_name().unwrap_or_default().to_string();
    let content = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("cannot read upload: {e}")))?;

    let mut series = parse_uploaded_series(&content, &filename)?;
    series.sort_by_key(|(ts, _)| *ts);

    let Some(&(last_ts, last_val)) = series.last() else {
        return Err(ApiError::BadRequest("uploaded series is empty".to_string()));
    };
    let forecast_points = flat_forecast(last_val, FORECAST_STEPS)
        .into_iter()
        .enumerate()
        .map(|(i, value)| ForecastPoint {
            timestamp: (last_ts + Duration::hours(i as i64 + 1)).to_rfc3339(),
            value,
        })
        .collect();

    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let (mae, rmse) = one_step_naive_errors(&values);

    Ok(Json(ForecastResponse {
        label: "Energy demand forecast".to_string(),
        confidence: 0.75,
        top_k: vec![
            TopK {
                label: "Peak load".to_string(),
                prob: 0.6,
            },
            TopK {
                label: "Normal trend".to_string(),
                prob: 0.3,
            },
            TopK {
                label: "Possible anomaly".to_string(),
                prob: 0.1,
            },
        ],
        forecast: forecast_points,
        model: "naive-persistence".to_string(),
        inference_ms: start.elapsed().as_millis() as u64,
        timestamp: Utc::now().to_rfc3339(),
        metrics: NaiveMetrics { mae, rmse },
    }))
}

/// Parse an uploaded CSV or JSON series into (timestamp, value) pairs.
///
/// Precedence: explicit `timestamp` + `value` columns, else best-effort
/// detection of a date-like column and the first numeric column, else
/// synthetic minute-spaced timestamps for a leading numeric column.
fn parse_uploaded_series(
    content: &[u8],
    filename: &str,
) -> PipelineResult<Vec<(DateTime<Utc>, f64)>> {
    let text = String::from_utf8_lossy(content);
    let (headers, rows) = if filename.to_lowercase().ends_with(".json")
        || text.trim_start().starts_with('[')
    {
        parse_json_table(&text)?
    } else {
        parse_csv_table(&text)?
    };
    standardize(&headers, &rows)
}

type Table = (Vec<String>, Vec<Vec<String>>);

fn parse_json_table(text: &str) -> PipelineResult<Table> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(text)
        .map_err(|e| PipelineError::data_format(format!("invalid JSON series: {e}")))?;
    let mut headers: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }
    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|h| match record.get(h) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();
    Ok((headers, rows))
}

fn parse_csv_table(text: &str) -> PipelineResult<Table> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::data_format(format!("invalid CSV series: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| PipelineError::data_format(format!("invalid CSV row: {e}")))?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }
    Ok((headers, rows))
}

fn standardize(
    headers: &[String],
    rows: &[Vec<String>],
) -> PipelineResult<Vec<(DateTime<Utc>, f64)>> {
    let col = |name: &str| headers.iter().position(|h| h == name);

    // explicit schema wins
    if let (Some(ts_idx), Some(val_idx)) = (col("timestamp"), col("value")) {
        return Ok(collect_pairs(rows, ts_idx, val_idx));
    }

    // best effort: first date-like column + first numeric column
    let datetime_col = (0..headers.len()).find(|&idx| {
        let parsed = rows
            .iter()
            .filter(|r| parse_datetime(&r[idx]).is_some())
            .count();
        !rows.is_empty() && parsed * 2 > rows.len()
    });
    let numeric_cols: Vec<usize> = (0..headers.len())
        .filter(|idx| Some(*idx) != datetime_col && column_is_numeric(rows, *idx))
        .collect();
    if numeric_cols.len() > 1 {
        debug!(
            candidates = numeric_cols.len(),
            "multiple numeric columns in upload; using the first"
        );
    }
    if let (Some(ts_idx), Some(&val_idx)) = (datetime_col, numeric_cols.first()) {
        return Ok(collect_pairs(rows, ts_idx, val_idx));
    }

    // last resort: leading numeric column with synthetic minute spacing
    if !headers.is_empty() && column_is_numeric(rows, 0) && !rows.is_empty() {
        let base = Utc::now() - Duration::minutes(rows.len() as i64);
        return Ok(rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row[0]
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|v| (base + Duration::minutes(i as i64), v))
            })
            .collect());
    }

    Err(PipelineError::data_format(
        "unable to parse time series; provide timestamp,value format",
    ))
}

fn collect_pairs(rows: &[Vec<String>], ts_idx: usize, val_idx: usize) -> Vec<(DateTime<Utc>, f64)> {
    rows.iter()
        .filter_map(|row| {
            let ts = parse_datetime(&row[ts_idx])?;
            let value = row[val_idx].trim().parse::<f64>().ok()?;
            Some((ts, value))
        })
        .collect()
}

fn column_is_numeric(rows: &[Vec<String>], idx: usize) -> bool {
    let mut seen = 0usize;
    for row in rows {
        let cell = row[idx].trim();
        if cell.is_empty() {
            continue;
        }
        if cell.parse::<f64>().is_err() {
            return false;
        }
        seen += 1;
    }
    seen > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_schema_takes_precedence() {
        let csv = "timestamp,other,value\n2024-01-01 00:00:00,9,1.5\nbad-ts,9,2.0\n";
        let series = parse_uploaded_series(csv.as_bytes(), "upload.csv").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].1, 1.5);
    }

    #[test]
    fn sniffs_datetime_and_numeric_columns() {
        let csv = "when,load\n2024-01-01 00:00:00,10\n2024-01-01 01:00:00,12\n";
        let series = parse_uploaded_series(csv.as_bytes(), "upload.csv").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].1, 12.0);
    }

    #[test]
    fn bare_numeric_column_gets_synthetic_timestamps() {
        let csv = "reading\n1.0\n2.0\n3.0\n";
        let series = parse_uploaded_series(csv.as_bytes(), "upload.csv").unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|w| w[1].0 - w[0].0 == Duration::minutes(1)));
    }

    #[test]
    fn json_array_uploads_parse() {
        let json = r#"[
            {"timestamp": "2024-01-01T00:00:00Z", "value": 10},
            {"timestamp": "2024-01-01T01:00:00Z", "value": 12}
        ]"#;
        let series = parse_uploaded_series(json.as_bytes(), "upload.json").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].1, 10.0);
    }

    #[test]
    fn unparsable_upload_is_a_data_format_error() {
        let csv = "name,city\nalice,oslo\n";
        assert!(matches!(
            parse_uploaded_series(csv.as_bytes(), "upload.csv"),
            Err(PipelineError::DataFormat(_))
        ));
    }
}
