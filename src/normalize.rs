//! Maps heterogeneous API payloads to canonical records.
//!
//! Every resource goes through the same steps: unwrap the `{success, data}`
//! envelope, locate the record list (bare array, a known wrapper key, or
//! the first non-empty array property), then extract each element with a
//! prioritized key list. Elements that cannot be mapped are dropped; an
//! empty result is `ShapeUnrecognized`.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::collation;
use crate::error::ResolveError;
use crate::logging::log_dropped_element;
use crate::models::{
    CountryRecord, CountrySeries, CountryValue, FeatureImportanceRecord, GlobalStats,
    ModelMetrics, Overview, PredictionPoint, TimeSeriesPoint,
};

pub const COUNTRY_WRAPPERS: &[&str] = &["countries", "data", "results"];
pub const FEATURE_WRAPPERS: &[&str] =
    &["features", "feature_importance", "importances", "data", "results"];
pub const SERIES_WRAPPERS: &[&str] = &["series", "datasets", "data", "results"];
pub const POINT_WRAPPERS: &[&str] = &["points", "raw_data", "data", "values", "results"];
pub const PREDICTION_WRAPPERS: &[&str] = &["predictions", "forecast", "data", "results"];

const NAME_KEYS: &[&str] = &["name", "feature", "label", "title"];
const IMPORTANCE_KEYS: &[&str] = &["importance", "value", "score", "weight"];
const CODE_KEYS: &[&str] = &["code", "id", "iso", "iso_code", "country_code"];
const COUNTRY_NAME_KEYS: &[&str] = &[
    "name",
    "display_name",
    "displayName",
    "country",
    "country_name",
    "label",
    "title",
];
const SERIES_COUNTRY_KEYS: &[&str] = &["country", "country_name", "label", "name", "code"];
const SERIES_POINT_KEYS: &[&str] = &["points", "time_series", "data", "values", "series"];
const YEAR_KEYS: &[&str] = &["year", "label", "x", "date"];
const VALUE_KEYS: &[&str] = &["value", "y", "renewable_share", "percentage", "share"];
const FORECAST_VALUE_KEYS: &[&str] = &["value", "predicted_value", "prediction", "y"];
const LABEL_KEYS: &[&str] = &["labels", "years"];
const LOWER_KEYS: &[&str] = &["lower", "lower_bound", "min"];
const UPPER_KEYS: &[&str] = &["upper", "upper_bound", "max"];

// =============================================================================
// Envelope and list location
// =============================================================================

/// Objects to search, innermost first. `success: false` is a failed payload.
pub fn layers(payload: &Value) -> Result<Vec<&Map<String, Value>>, ResolveError> {
    let Value::Object(outer) = payload else {
        return Ok(Vec::new());
    };
    if outer.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = pick(outer, &["error", "message"])
            .and_then(text)
            .unwrap_or_else(|| "success=false".to_string());
        return Err(ResolveError::shape(format!("server reported failure: {}", reason)));
    }
    let mut out = Vec::with_capacity(2);
    if let Some(Value::Object(inner)) = outer.get("data") {
        out.push(inner);
    }
    out.push(outer);
    Ok(out)
}

fn wrapped_list<'a>(map: &'a Map<String, Value>, wrappers: &[&str]) -> Option<&'a [Value]> {
    wrappers
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn first_array(map: &Map<String, Value>) -> Option<&[Value]> {
    map.values()
        .find_map(|v| v.as_array().filter(|a| !a.is_empty()))
        .map(Vec::as_slice)
}

/// Locates the record array for a resource.
///
/// Wrapper keys are tried on every layer before any layer is scanned for
/// its first non-empty array.
pub fn extract_list<'a>(
    payload: &'a Value,
    wrappers: &[&str],
) -> Result<&'a [Value], ResolveError> {
    if let Value::Array(items) = payload {
        return Ok(items);
    }
    let layers = layers(payload)?;
    layers
        .iter()
        .copied()
        .find_map(|layer| wrapped_list(layer, wrappers))
        .or_else(|| layers.iter().copied().find_map(first_array))
        .ok_or_else(|| ResolveError::shape("no array found in payload"))
}

// =============================================================================
// Scalar coercion
// =============================================================================

fn pick<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers as-is; strings parsed after trimming, tolerating a trailing `%`.
pub fn coerce_f64(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Years may arrive as numbers, numeric strings or dates.
pub fn parse_year(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i32)
                })
                .or_else(|| {
                    let head: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
                    (head.len() == 4).then(|| head.parse().ok()).flatten()
                })
        }
        _ => None,
    }
}

/// Maps any importance onto 0-100: negatives to 0, fractions scaled by 100.
pub fn normalize_importance(v: f64) -> f64 {
    if v < 0.0 {
        0.0
    } else if v <= 1.0 {
        v * 100.0
    } else {
        v.min(100.0)
    }
}

// =============================================================================
// Countries
// =============================================================================

fn country_from(item: &Value) -> Result<CountryRecord, &'static str> {
    match item {
        Value::String(_) | Value::Number(_) => {
            let name = text(item).ok_or("empty country string")?;
            Ok(CountryRecord::new(name.clone(), name))
        }
        Value::Object(map) => {
            let code = pick(map, CODE_KEYS).and_then(text);
            let name = pick(map, COUNTRY_NAME_KEYS).and_then(text);
            match (code, name) {
                (Some(code), Some(name)) => Ok(CountryRecord::new(code, name)),
                (Some(code), None) => Ok(CountryRecord::new(code.clone(), code)),
                (None, Some(name)) => Ok(CountryRecord::new(name.clone(), name)),
                (None, None) => Err("no code or name"),
            }
        }
        _ => Err("unsupported element type"),
    }
}

/// Unique by code (case-insensitive, first wins), optionally collated.
pub fn normalize_countries(
    payload: &Value,
    sort: bool,
) -> Result<Vec<CountryRecord>, ResolveError> {
    let items = extract_list(payload, COUNTRY_WRAPPERS)?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match country_from(item) {
            Ok(rec) => {
                if seen.insert(rec.code.to_lowercase()) {
                    out.push(rec);
                }
            }
            Err(reason) => log_dropped_element("countries", i, reason),
        }
    }
    if out.is_empty() {
        return Err(ResolveError::shape("no usable country records"));
    }
    if sort {
        collation::sort_by_key(&mut out, |c| c.display_name.as_str());
    }
    Ok(out)
}

// =============================================================================
// Feature importance
// =============================================================================

fn feature_from(item: &Value) -> Result<(String, f64), &'static str> {
    match item {
        Value::Object(map) => {
            let mut name = pick(map, NAME_KEYS).and_then(text);
            let mut importance = pick(map, IMPORTANCE_KEYS).and_then(coerce_f64);
            if name.is_none() {
                // `{"Year": 0.42}`: the first non-value key names the feature.
                let first_named = map
                    .iter()
                    .find(|(k, _)| !IMPORTANCE_KEYS.contains(&k.as_str()));
                if let Some((k, v)) = first_named {
                    name = Some(k.clone());
                    if importance.is_none() {
                        importance = coerce_f64(v);
                    }
                }
            }
            match (name, importance) {
                (Some(n), Some(v)) => Ok((n, v)),
                (None, _) => Err("no name field"),
                (_, None) => Err("no importance value"),
            }
        }
        Value::Array(pair) if pair.len() == 2 => {
            let name = text(&pair[0]).ok_or("pair without name")?;
            let value = coerce_f64(&pair[1]).ok_or("pair without value")?;
            Ok((name, value))
        }
        _ => Err("unsupported element type"),
    }
}

/// Importances on the 0-100 scale, sorted descending and ranked from 1.
pub fn normalize_features(payload: &Value) -> Result<Vec<FeatureImportanceRecord>, ResolveError> {
    let items = extract_list(payload, FEATURE_WRAPPERS)?;
    let mut out: Vec<FeatureImportanceRecord> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match feature_from(item) {
            Ok((name, raw)) => out.push(FeatureImportanceRecord {
                name,
                importance: normalize_importance(raw),
                rank: 0,
            }),
            Err(reason) => log_dropped_element("feature_importance", i, reason),
        }
    }
    if out.is_empty() {
        return Err(ResolveError::shape("no usable feature records"));
    }
    Ok(rank_features(out))
}

pub fn rank_features(mut records: Vec<FeatureImportanceRecord>) -> Vec<FeatureImportanceRecord> {
    records.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, r) in records.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    records
}

// =============================================================================
// Time series
// =============================================================================

fn point_from_object(map: &Map<String, Value>) -> Option<TimeSeriesPoint> {
    let year = pick(map, YEAR_KEYS).and_then(parse_year)?;
    Some(TimeSeriesPoint::new(year, pick(map, VALUE_KEYS).and_then(coerce_f64)))
}

/// Points from a year->value map, a list of point objects, or a value list
/// paired with `labels`.
fn points_from(value: &Value, labels: Option<&[Value]>) -> Vec<TimeSeriesPoint> {
    match value {
        Value::Object(map) => {
            if let Some(inner) = pick(map, SERIES_POINT_KEYS) {
                let own_labels = pick(map, LABEL_KEYS).and_then(Value::as_array).map(Vec::as_slice);
                return points_from(inner, own_labels.or(labels));
            }
            map.iter()
                .filter_map(|(k, v)| {
                    let year = parse_year(&Value::String(k.clone()))?;
                    Some(TimeSeriesPoint::new(year, coerce_f64(v)))
                })
                .collect()
        }
        Value::Array(items) => {
            if items.iter().any(Value::is_object) {
                return items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(point_from_object)
                    .collect();
            }
            let Some(labels) = labels else {
                return Vec::new();
            };
            labels
                .iter()
                .zip(items.iter())
                .filter_map(|(label, v)| {
                    Some(TimeSeriesPoint::new(parse_year(label)?, coerce_f64(v)))
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn finish_points(mut points: Vec<TimeSeriesPoint>) -> Result<Vec<TimeSeriesPoint>, ResolveError> {
    if points.is_empty() {
        return Err(ResolveError::shape("no usable time series points"));
    }
    points.sort_by_key(|p| p.year);
    Ok(points)
}

fn points_in_layer(layer: &Map<String, Value>) -> Vec<TimeSeriesPoint> {
    let labels = pick(layer, LABEL_KEYS).and_then(Value::as_array).map(Vec::as_slice);

    if let (Some(labels), Some(values)) = (labels, layer.get("values")) {
        let pts = points_from(values, Some(labels));
        if !pts.is_empty() {
            return pts;
        }
    }
    if let Some(Value::Object(chart)) = layer.get("chart_data") {
        let pts = points_in_layer(chart);
        if !pts.is_empty() {
            return pts;
        }
    }
    if let Some(datasets) = layer.get("datasets").and_then(Value::as_array) {
        if let Some(first) = datasets.first() {
            let pts = points_from(first, labels);
            if !pts.is_empty() {
                return pts;
            }
        }
    }
    if let Some(ts) = layer.get("time_series") {
        let pts = points_from(ts, labels);
        if !pts.is_empty() {
            return pts;
        }
    }
    wrapped_list(layer, POINT_WRAPPERS)
        .map(|items| points_from_list(layer, items))
        .unwrap_or_default()
}

fn points_from_list(layer: &Map<String, Value>, items: &[Value]) -> Vec<TimeSeriesPoint> {
    let labels = pick(layer, LABEL_KEYS).and_then(Value::as_array).map(Vec::as_slice);
    let pts = points_from(&Value::Array(items.to_vec()), labels);
    if pts.is_empty() {
        log_dropped_element("country_detail", 0, "list without year/value points");
    }
    pts
}

/// One country's historical series.
pub fn normalize_points(payload: &Value) -> Result<Vec<TimeSeriesPoint>, ResolveError> {
    if let Value::Array(_) = payload {
        return finish_points(points_from(payload, None));
    }
    let layers = layers(payload)?;
    let known = layers.iter().copied().map(points_in_layer);
    let scanned = layers
        .iter()
        .copied()
        .filter_map(|layer| first_array(layer).map(|items| points_from_list(layer, items)));
    match known.chain(scanned).find(|pts| !pts.is_empty()) {
        Some(pts) => finish_points(pts),
        None => Err(ResolveError::shape("no time series found in payload")),
    }
}

// =============================================================================
// Comparison
// =============================================================================

fn series_from_country_map(map: &Map<String, Value>) -> Vec<CountrySeries> {
    map.iter()
        .filter_map(|(country, v)| {
            let pts = points_from(v, None);
            if pts.is_empty() {
                log_dropped_element("comparison", 0, "country entry without points");
                None
            } else {
                Some(CountrySeries::new(country.clone(), pts))
            }
        })
        .collect()
}

fn series_from_chart(chart: &Map<String, Value>) -> Vec<CountrySeries> {
    let labels = pick(chart, LABEL_KEYS).and_then(Value::as_array).map(Vec::as_slice);
    let Some(datasets) = chart.get("datasets").and_then(Value::as_array) else {
        return Vec::new();
    };
    datasets
        .iter()
        .enumerate()
        .filter_map(|(i, ds)| {
            let map = ds.as_object()?;
            let country = pick(map, SERIES_COUNTRY_KEYS).and_then(text);
            let pts = points_from(ds, labels);
            match country {
                Some(c) if !pts.is_empty() => Some(CountrySeries::new(c, pts)),
                _ => {
                    log_dropped_element("comparison", i, "dataset without label or points");
                    None
                }
            }
        })
        .collect()
}

/// Elements are either whole series (`{country, data}`) or flat rows
/// (`{country, year, value}`) grouped by country in first-seen order.
fn series_from_list(items: &[Value], labels: Option<&[Value]>) -> Vec<CountrySeries> {
    let mut grouped: Vec<(String, Vec<TimeSeriesPoint>)> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let Some(map) = item.as_object() else {
            log_dropped_element("comparison", i, "unsupported element type");
            continue;
        };
        let Some(country) = pick(map, SERIES_COUNTRY_KEYS).and_then(text) else {
            log_dropped_element("comparison", i, "no country field");
            continue;
        };
        let pts = if pick(map, SERIES_POINT_KEYS).is_some() {
            points_from(item, labels)
        } else {
            point_from_object(map).into_iter().collect()
        };
        if pts.is_empty() {
            log_dropped_element("comparison", i, "no points");
            continue;
        }
        match grouped.iter_mut().find(|(c, _)| *c == country) {
            Some((_, existing)) => existing.extend(pts),
            None => grouped.push((country, pts)),
        }
    }
    grouped
        .into_iter()
        .map(|(c, pts)| CountrySeries::new(c, pts))
        .collect()
}

fn series_in_layer(layer: &Map<String, Value>) -> Vec<CountrySeries> {
    for key in ["country_data", "countries"] {
        if let Some(Value::Object(map)) = layer.get(key) {
            let s = series_from_country_map(map);
            if !s.is_empty() {
                return s;
            }
        }
    }
    if let Some(Value::Object(chart)) = layer.get("chart_data") {
        let s = series_from_chart(chart);
        if !s.is_empty() {
            return s;
        }
    }
    if layer.contains_key("datasets") {
        let s = series_from_chart(layer);
        if !s.is_empty() {
            return s;
        }
    }
    wrapped_list(layer, SERIES_WRAPPERS)
        .map(|items| series_from_layer_list(layer, items))
        .unwrap_or_default()
}

fn series_from_layer_list(layer: &Map<String, Value>, items: &[Value]) -> Vec<CountrySeries> {
    let labels = pick(layer, LABEL_KEYS).and_then(Value::as_array).map(Vec::as_slice);
    series_from_list(items, labels)
}

/// Per-country series, ordered as `requested` where possible.
pub fn normalize_comparison(
    payload: &Value,
    requested: &[String],
) -> Result<Vec<CountrySeries>, ResolveError> {
    let mut series = match payload {
        Value::Array(items) => series_from_list(items, None),
        _ => {
            let layers = layers(payload)?;
            let known = layers.iter().copied().map(series_in_layer);
            let scanned = layers.iter().copied().filter_map(|layer| {
                first_array(layer).map(|items| series_from_layer_list(layer, items))
            });
            known.chain(scanned).find(|s| !s.is_empty()).unwrap_or_default()
        }
    };
    if series.is_empty() {
        return Err(ResolveError::shape("no comparison series found in payload"));
    }
    let position = |country: &str| {
        requested
            .iter()
            .position(|r| r.to_lowercase() == country.to_lowercase())
            .unwrap_or(usize::MAX)
    };
    series.sort_by_key(|s| position(&s.country));
    Ok(series)
}

// =============================================================================
// Prediction
// =============================================================================

fn band(map: &Map<String, Value>) -> (Option<f64>, Option<f64>) {
    let ci = map.get("confidence_interval").and_then(Value::as_object);
    let lower = pick(map, LOWER_KEYS)
        .or_else(|| ci.and_then(|c| pick(c, LOWER_KEYS)))
        .and_then(coerce_f64);
    let upper = pick(map, UPPER_KEYS)
        .or_else(|| ci.and_then(|c| pick(c, UPPER_KEYS)))
        .and_then(coerce_f64);
    (lower, upper)
}

fn forecast_point(
    year: i32,
    value: f64,
    lower: Option<f64>,
    upper: Option<f64>,
) -> PredictionPoint {
    match (lower, upper) {
        (Some(lower), Some(upper)) => PredictionPoint {
            year,
            value: Some(value),
            lower: Some(lower),
            upper: Some(upper),
            is_prediction: true,
        },
        _ => PredictionPoint::forecast(year, value),
    }
}

fn prediction_from_object(
    map: &Map<String, Value>,
    default_forecast: bool,
) -> Option<PredictionPoint> {
    let year =
        pick(map, &["year", "target_year", "future_year", "label", "x"]).and_then(parse_year)?;
    let is_prediction = map
        .get("is_prediction")
        .and_then(Value::as_bool)
        .unwrap_or(default_forecast);
    let value = pick(map, FORECAST_VALUE_KEYS).and_then(coerce_f64);
    if !is_prediction {
        return Some(PredictionPoint::historical(year, value));
    }
    let (lower, upper) = band(map);
    Some(forecast_point(year, value?, lower, upper))
}

fn prediction_from_chart(chart: &Map<String, Value>) -> Vec<PredictionPoint> {
    let Some(labels) = pick(chart, LABEL_KEYS).and_then(Value::as_array) else {
        return Vec::new();
    };
    let Some(values) = chart.get("values").and_then(Value::as_array) else {
        return Vec::new();
    };
    let flags = chart.get("is_prediction").and_then(Value::as_array);
    labels
        .iter()
        .zip(values.iter())
        .enumerate()
        .filter_map(|(i, (label, v))| {
            let year = parse_year(label)?;
            let value = coerce_f64(v);
            let forecast = flags
                .and_then(|f| f.get(i))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            match (forecast, value) {
                (true, Some(v)) => Some(PredictionPoint::forecast(year, v)),
                (true, None) => None,
                (false, value) => Some(PredictionPoint::historical(year, value)),
            }
        })
        .collect()
}

fn predictions_in_layer(layer: &Map<String, Value>) -> Vec<PredictionPoint> {
    if let Some(Value::Object(chart)) = layer.get("chart_data") {
        let pts = prediction_from_chart(chart);
        if pts.iter().any(|p| p.is_prediction) {
            return pts;
        }
    }

    let mut pts: Vec<PredictionPoint> = Vec::new();
    for key in ["history", "historical", "raw_data"] {
        if let Some(items) = layer.get(key).and_then(Value::as_array) {
            pts.extend(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(|m| prediction_from_object(m, false)),
            );
            break;
        }
    }
    if let Some(items) = PREDICTION_WRAPPERS
        .iter()
        .find_map(|k| layer.get(*k).and_then(Value::as_array))
    {
        pts.extend(
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|m| prediction_from_object(m, true)),
        );
    }
    if pts.iter().any(|p| p.is_prediction) {
        return pts;
    }

    // `{"prediction": {"value", "confidence_interval"}, "year": ..}` or a bare number.
    match layer.get("prediction") {
        Some(Value::Object(pred)) => {
            let mut with_year = pred.clone();
            if !with_year.contains_key("year") {
                if let Some(y) = pick(layer, &["year", "target_year", "future_year"]) {
                    with_year.insert("year".to_string(), y.clone());
                }
            }
            pts.extend(prediction_from_object(&with_year, true));
        }
        Some(v @ Value::Number(_)) | Some(v @ Value::String(_)) => {
            let year = pick(layer, &["year", "target_year", "future_year"]).and_then(parse_year);
            if let (Some(year), Some(value)) = (year, coerce_f64(v)) {
                pts.push(PredictionPoint::forecast(year, value));
            }
        }
        _ => {}
    }
    pts
}

/// History and forecast points; at least one forecast point is required.
pub fn normalize_prediction(payload: &Value) -> Result<Vec<PredictionPoint>, ResolveError> {
    let mut pts: Vec<PredictionPoint> = match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|m| prediction_from_object(m, true))
            .collect(),
        _ => layers(payload)?
            .into_iter()
            .map(predictions_in_layer)
            .find(|p| p.iter().any(|p| p.is_prediction))
            .unwrap_or_default(),
    };
    if !pts.iter().any(|p| p.is_prediction) {
        return Err(ResolveError::shape("no forecast points found in payload"));
    }
    pts.sort_by_key(|p| (p.year, p.is_prediction));
    Ok(pts)
}

// =============================================================================
// Overview
// =============================================================================

const TOP_KEYS: &[&str] = &["top_countries", "highest_countries"];
const BOTTOM_KEYS: &[&str] = &["bottom_countries", "lowest_countries"];

fn country_value(item: &Value) -> Result<CountryValue, &'static str> {
    let map = item.as_object().ok_or("unsupported element type")?;
    let country = pick(map, SERIES_COUNTRY_KEYS).and_then(text).ok_or("no country field")?;
    let value = pick(map, VALUE_KEYS)
        .or_else(|| map.get("renewable_value"))
        .and_then(coerce_f64)
        .ok_or("no value")?;
    Ok(CountryValue { country, value })
}

/// Rows from a `[{country, value}]` list or a `{labels, datasets[0].data}` chart.
fn country_values(layer: &Map<String, Value>, keys: &[&str], chart_key: &str) -> Vec<CountryValue> {
    if let Some(items) = wrapped_list(layer, keys) {
        return items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match country_value(item) {
                Ok(row) => Some(row),
                Err(reason) => {
                    log_dropped_element("overview", i, reason);
                    None
                }
            })
            .collect();
    }
    let Some(chart) = layer.get(chart_key).and_then(Value::as_object) else {
        return Vec::new();
    };
    let labels = pick(chart, LABEL_KEYS).and_then(Value::as_array);
    let values = chart
        .get("datasets")
        .and_then(Value::as_array)
        .and_then(|ds| ds.first())
        .and_then(|ds| ds.get("data"))
        .and_then(Value::as_array);
    match (labels, values) {
        (Some(labels), Some(values)) => labels
            .iter()
            .zip(values.iter())
            .filter_map(|(label, v)| {
                Some(CountryValue {
                    country: text(label)?,
                    value: coerce_f64(v)?,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn global_stats(layer: &Map<String, Value>) -> Option<GlobalStats> {
    let map = layer.get("global_stats").and_then(Value::as_object)?;
    let stats = GlobalStats {
        total_countries: pick(map, &["total_countries", "country_count"])
            .and_then(coerce_f64)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64),
        mean: map.get("mean").and_then(coerce_f64),
        min: map.get("min").and_then(coerce_f64),
        max: map.get("max").and_then(coerce_f64),
        years_range: pick(map, &["years_range", "year_range"]).and_then(text),
    };
    (stats != GlobalStats::default()).then_some(stats)
}

fn overview_in_layer(layer: &Map<String, Value>) -> Option<Overview> {
    let target = layer.get("overview").and_then(Value::as_object).unwrap_or(layer);
    let stats = global_stats(target);
    let mut top = country_values(target, TOP_KEYS, "highest_chart");
    let mut bottom = country_values(target, BOTTOM_KEYS, "lowest_chart");
    if stats.is_none() && top.is_empty() && bottom.is_empty() {
        return None;
    }
    top.sort_by(|a, b| b.value.total_cmp(&a.value));
    bottom.sort_by(|a, b| a.value.total_cmp(&b.value));
    Some(Overview {
        global_stats: stats.unwrap_or_default(),
        top_countries: top,
        bottom_countries: bottom,
    })
}

/// A single overview record; needs global stats or at least one ranking.
pub fn normalize_overview(payload: &Value) -> Result<Vec<Overview>, ResolveError> {
    layers(payload)?
        .into_iter()
        .find_map(overview_in_layer)
        .map(|o| vec![o])
        .ok_or_else(|| ResolveError::shape("no overview data found in payload"))
}

// =============================================================================
// Model metrics
// =============================================================================

fn metrics_in_layer(layer: &Map<String, Value>) -> Option<ModelMetrics> {
    let metrics = layer.get("metrics").and_then(Value::as_object).unwrap_or(layer);
    let r2 = pick(metrics, &["r2", "r2_score", "r_squared"]).and_then(coerce_f64);
    let mae = metrics.get("mae").and_then(coerce_f64);
    let rmse = metrics.get("rmse").and_then(coerce_f64);
    let mse = metrics.get("mse").and_then(coerce_f64);
    if r2.is_none() && mae.is_none() && rmse.is_none() && mse.is_none() {
        return None;
    }
    let features = layer
        .get("features")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => pick(map, NAME_KEYS).and_then(text),
                    other => text(other),
                })
                .collect()
        })
        .unwrap_or_default();
    Some(ModelMetrics {
        country: pick(layer, &["country", "country_name"]).and_then(text),
        r2,
        mae,
        rmse,
        mse,
        quality: pick(layer, &["model_quality", "quality"]).and_then(text),
        features,
    })
}

/// A single metrics record; needs at least one of r2, mae, rmse or mse.
pub fn normalize_model_metrics(payload: &Value) -> Result<Vec<ModelMetrics>, ResolveError> {
    layers(payload)?
        .into_iter()
        .find_map(metrics_in_layer)
        .map(|m| vec![m])
        .ok_or_else(|| ResolveError::shape("no model metrics found in payload"))
}
