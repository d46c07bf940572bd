//! Canonical records produced by the resolver, whatever shape the API used.

use serde::{Deserialize, Serialize};

/// Where a resolution's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Api => "api",
            Source::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub code: String,
    pub display_name: String,
}

impl CountryRecord {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

/// Importance is always on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceRecord {
    pub name: String,
    pub importance: f64,
    pub rank: usize,
}

/// `value == None` is a missing observation, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

impl TimeSeriesPoint {
    pub fn new(year: i32, value: Option<f64>) -> Self {
        Self { year, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub trend: Option<f64>,
}

/// One country's series inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country: String,
    pub points: Vec<TimeSeriesPoint>,
    pub stats: SeriesStats,
}

impl CountrySeries {
    /// Sorts points chronologically and derives stats.
    pub fn new(country: impl Into<String>, mut points: Vec<TimeSeriesPoint>) -> Self {
        points.sort_by_key(|p| p.year);
        let stats = crate::stats::series_stats(&points);
        Self {
            country: country.into(),
            points,
            stats,
        }
    }
}

/// A comparison is the ordered list of per-country series.
pub type ComparisonDataset = Vec<CountrySeries>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub year: i32,
    pub value: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub is_prediction: bool,
}

/// Relative half-width of the confidence band when the API gives none.
pub const DEFAULT_BAND: f64 = 0.15;

impl PredictionPoint {
    pub fn historical(year: i32, value: Option<f64>) -> Self {
        Self {
            year,
            value,
            lower: None,
            upper: None,
            is_prediction: false,
        }
    }

    /// Forecast point with the default ±15% band, lower bound floored at 0.
    pub fn forecast(year: i32, value: f64) -> Self {
        let margin = value.abs() * DEFAULT_BAND;
        Self {
            year,
            value: Some(value),
            lower: Some((value - margin).max(0.0)),
            upper: Some(value + margin),
            is_prediction: true,
        }
    }
}

/// One row of the overview's highest or lowest table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryValue {
    pub country: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_countries: Option<u64>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub years_range: Option<String>,
}

/// Dataset summary shown on the landing view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Overview {
    pub global_stats: GlobalStats,
    /// Highest values first.
    pub top_countries: Vec<CountryValue>,
    /// Lowest values first.
    pub bottom_countries: Vec<CountryValue>,
}

/// Quality of the trained model, globally or for one country.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub country: Option<String>,
    pub r2: Option<f64>,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub mse: Option<f64>,
    pub quality: Option<String>,
    pub features: Vec<String>,
}

/// Envelope every resolution returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult<T> {
    pub records: Vec<T>,
    pub source: Source,
    pub endpoint_used: Option<String>,
}

impl<T> ResolutionResult<T> {
    pub fn api(records: Vec<T>, endpoint: impl Into<String>) -> Self {
        Self {
            records,
            source: Source::Api,
            endpoint_used: Some(endpoint.into()),
        }
    }

    pub fn fallback(records: Vec<T>) -> Self {
        Self {
            records,
            source: Source::Fallback,
            endpoint_used: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// A logical resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Countries,
    Overview,
    FeatureImportance { country: Option<String> },
    Comparison { countries: Vec<String> },
    CountryDetail { country: String },
    Prediction { country: String, years: u32 },
    ModelMetrics { country: Option<String> },
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Countries => "countries",
            Resource::Overview => "overview",
            Resource::FeatureImportance { .. } => "feature_importance",
            Resource::Comparison { .. } => "comparison",
            Resource::CountryDetail { .. } => "country_detail",
            Resource::Prediction { .. } => "prediction",
            Resource::ModelMetrics { .. } => "model_metrics",
        }
    }

    /// Named parameters used to expand endpoint templates.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Resource::Countries | Resource::Overview => Vec::new(),
            Resource::FeatureImportance { country } | Resource::ModelMetrics { country } => country
                .iter()
                .map(|c| ("country", c.clone()))
                .collect(),
            Resource::Comparison { countries } => vec![("countries", countries.join(","))],
            Resource::CountryDetail { country } => vec![("country", country.clone())],
            Resource::Prediction { country, years } => vec![
                ("country", country.clone()),
                ("years", years.to_string()),
            ],
        }
    }
}

/// Result of the generic entry point, one variant per resource kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Countries(ResolutionResult<CountryRecord>),
    Overview(ResolutionResult<Overview>),
    FeatureImportance(ResolutionResult<FeatureImportanceRecord>),
    Comparison(ResolutionResult<CountrySeries>),
    CountryDetail(ResolutionResult<TimeSeriesPoint>),
    Prediction(ResolutionResult<PredictionPoint>),
    ModelMetrics(ResolutionResult<ModelMetrics>),
}

impl Resolution {
    pub fn source(&self) -> Source {
        match self {
            Resolution::Countries(r) => r.source,
            Resolution::Overview(r) => r.source,
            Resolution::FeatureImportance(r) => r.source,
            Resolution::Comparison(r) => r.source,
            Resolution::CountryDetail(r) => r.source,
            Resolution::Prediction(r) => r.source,
            Resolution::ModelMetrics(r) => r.source,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolution::Countries(r) => r.records.len(),
            Resolution::Overview(r) => r.records.len(),
            Resolution::FeatureImportance(r) => r.records.len(),
            Resolution::Comparison(r) => r.records.len(),
            Resolution::CountryDetail(r) => r.records.len(),
            Resolution::Prediction(r) => r.records.len(),
            Resolution::ModelMetrics(r) => r.records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
