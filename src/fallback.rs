//! Deterministic placeholder data served when no endpoint yields usable
//! records. Same input, same output: nothing here is random.

use std::ops::RangeInclusive;

use crate::models::{
    CountryRecord, CountrySeries, CountryValue, FeatureImportanceRecord, GlobalStats,
    ModelMetrics, Overview, PredictionPoint, TimeSeriesPoint,
};
use crate::normalize::rank_features;
use crate::stats::{mean_slope, stats_of};

pub const DEMO_COUNTRIES: &[(&str, &str)] = &[
    ("global", "Global"),
    ("tr", "Türkiye"),
    ("us", "Amerika Birleşik Devletleri"),
    ("de", "Almanya"),
    ("gb", "Birleşik Krallık"),
    ("fr", "Fransa"),
    ("jp", "Japonya"),
    ("cn", "Çin"),
    ("in", "Hindistan"),
    ("br", "Brezilya"),
    ("ru", "Rusya"),
];

pub const ENERGY_FEATURES: &[&str] = &[
    "Renewable Energy Investment",
    "Energy Consumption Ratio",
    "Carbon Emission Levels",
    "Electricity Generation Capacity",
    "Renewable Energy Share",
    "Solar Energy Capacity",
    "Wind Energy Capacity",
    "Fossil Fuel Dependency",
    "Energy Storage Capacity",
    "Energy Policies and Incentives",
    "Economic Development Level",
    "Population Density",
    "Technological Innovation Level",
    "Energy Efficiency Ratio",
    "Climate Conditions",
    "Geographic Features",
    "Infrastructure Development Level",
    "Energy Import Dependency",
    "Energy Production Costs",
    "Sustainability Targets",
];

/// Inputs of the regression model behind the prediction view.
pub const MODEL_INPUTS: &[&str] = &[
    "Year",
    "Continent",
    "Economic Status",
    "Year (Log)",
    "Population",
    "GDP",
    "Industry Size",
    "Year (Squared)",
    "Geographic Location",
    "Climate Zone",
];

const OVERVIEW_TABLE_LEN: usize = 5;
const GLOBAL_MODEL_SEED: u32 = 42;

const MIN_RAW_IMPORTANCE: f64 = 0.01;
const MAX_RAW_IMPORTANCE: f64 = 0.99;

/// `(multiplier, variance)` per known country; aliases cover English and
/// Turkish names as well as ISO codes.
fn profile(country: &str) -> (f64, f64) {
    match country.trim().to_lowercase().as_str() {
        "us" | "usa" | "united states" | "abd" | "amerika birleşik devletleri" => (1.1, 0.15),
        "tr" | "turkey" | "türkiye" | "turkiye" => (0.9, 0.08),
        "gb" | "uk" | "united kingdom" | "birleşik krallık" => (1.05, 0.12),
        "de" | "germany" | "almanya" => (1.15, 0.07),
        "fr" | "france" | "fransa" => (0.95, 0.11),
        "jp" | "japan" | "japonya" => (1.2, 0.09),
        "cn" | "china" | "çin" => (1.25, 0.14),
        _ => (1.0, 0.1),
    }
}

/// Sum of the character codes of the lower-cased identifier.
pub fn country_seed(country: &str) -> u32 {
    country
        .to_lowercase()
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_add(c as u32))
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn model_quality(r2: f64) -> &'static str {
    if r2 >= 0.8 {
        "good"
    } else if r2 >= 0.6 {
        "fair"
    } else {
        "poor"
    }
}

fn name_seed(country: &str) -> u32 {
    country.chars().next().map(|c| c as u32).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    years: RangeInclusive<i32>,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::new(2013..=2023)
    }
}

impl FallbackSynthesizer {
    pub fn new(years: RangeInclusive<i32>) -> Self {
        Self { years }
    }

    pub fn years(&self) -> &RangeInclusive<i32> {
        &self.years
    }

    /// Fixed roster, returned in roster order.
    pub fn countries(&self) -> Vec<CountryRecord> {
        DEMO_COUNTRIES
            .iter()
            .map(|(code, name)| CountryRecord::new(*code, *name))
            .collect()
    }

    pub fn features(&self, country: &str) -> Vec<FeatureImportanceRecord> {
        let (multiplier, variance) = profile(country);
        let seed = country_seed(country) as f64;
        let n = ENERGY_FEATURES.len() as f64;

        let records = ENERGY_FEATURES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let base = (1.0 - i as f64 / n) * multiplier;
                let variation = variance * (seed + i as f64 * 1.7).sin();
                let raw = (base + variation).clamp(MIN_RAW_IMPORTANCE, MAX_RAW_IMPORTANCE);
                FeatureImportanceRecord {
                    name: name.to_string(),
                    importance: raw * 100.0,
                    rank: 0,
                }
            })
            .collect();
        rank_features(records)
    }

    /// One value per year: rising base trend plus a per-country oscillation.
    pub fn series_points(&self, country: &str) -> Vec<TimeSeriesPoint> {
        let seed = name_seed(country);
        let base = 10.0 + (seed % 15) as f64;
        self.years
            .clone()
            .enumerate()
            .map(|(i, year)| {
                let oscillation = (seed as f64 * year as f64).sin() * 3.0;
                let value = (base + i as f64 * 0.7 + oscillation).clamp(0.0, 100.0);
                TimeSeriesPoint::new(year, Some(value))
            })
            .collect()
    }

    pub fn comparison(&self, countries: &[String]) -> Vec<CountrySeries> {
        countries
            .iter()
            .map(|c| CountrySeries::new(c.clone(), self.series_points(c)))
            .collect()
    }

    pub fn country_detail(&self, country: &str) -> Vec<TimeSeriesPoint> {
        self.series_points(country)
    }

    /// Latest-year ranking and window statistics over the demo roster.
    pub fn overview(&self) -> Overview {
        let mut latest = Vec::new();
        let mut values = Vec::new();
        for (code, name) in DEMO_COUNTRIES {
            if *code == "global" {
                continue;
            }
            let points = self.series_points(name);
            values.extend(points.iter().filter_map(|p| p.value));
            if let Some(value) = points.last().and_then(|p| p.value) {
                latest.push(CountryValue {
                    country: name.to_string(),
                    value,
                });
            }
        }
        let stats = stats_of(&values);

        latest.sort_by(|a, b| b.value.total_cmp(&a.value));
        let top = latest.iter().take(OVERVIEW_TABLE_LEN).cloned().collect();
        let bottom = latest.iter().rev().take(OVERVIEW_TABLE_LEN).cloned().collect();

        Overview {
            global_stats: GlobalStats {
                total_countries: Some(latest.len() as u64),
                mean: stats.mean,
                min: stats.min,
                max: stats.max,
                years_range: Some(format!("{} - {}", self.years.start(), self.years.end())),
            },
            top_countries: top,
            bottom_countries: bottom,
        }
    }

    /// Per-country metrics seeded like the feature fallback; `None` is the
    /// dataset-wide model.
    pub fn model_metrics(&self, country: Option<&str>) -> ModelMetrics {
        let seed = country.map(country_seed).unwrap_or(GLOBAL_MODEL_SEED) as f64;
        let r2 = round4(0.75 + 0.15 * seed.sin());
        let mae = round4(0.15 + 0.05 * (seed * 1.3).cos());
        let rmse = round4(mae * 1.5);
        ModelMetrics {
            country: country.map(str::to_string),
            r2: Some(r2),
            mae: Some(mae),
            rmse: Some(rmse),
            mse: Some(round4(rmse * rmse)),
            quality: Some(model_quality(r2).to_string()),
            features: MODEL_INPUTS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Synthesized history followed by `years` extrapolated forecast points.
    pub fn prediction(&self, country: &str, years: u32) -> Vec<PredictionPoint> {
        let history = self.series_points(country);
        let slope = mean_slope(&history);
        let last_year = *self.years.end();
        let last_value = history.last().and_then(|p| p.value).unwrap_or(0.0);

        let mut out: Vec<PredictionPoint> = history
            .iter()
            .map(|p| PredictionPoint::historical(p.year, p.value))
            .collect();
        out.extend((1..=years.max(1)).map(|k| {
            let value = (last_value + slope * k as f64).clamp(0.0, 100.0);
            PredictionPoint::forecast(last_year + k as i32, value)
        }));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_is_fixed_and_ordered() {
        let s = FallbackSynthesizer::default();
        let c = s.countries();
        assert_eq!(c.len(), DEMO_COUNTRIES.len());
        assert_eq!(c[0], CountryRecord::new("global", "Global"));
        assert_eq!(c[1].display_name, "Türkiye");
        assert_eq!(s.countries(), c);
    }

    #[test]
    fn features_are_deterministic_per_country() {
        let s = FallbackSynthesizer::default();
        assert_eq!(s.features("Germany"), s.features("Germany"));
        let de = s.features("Germany");
        let tr = s.features("Turkey");
        assert!(de
            .iter()
            .zip(tr.iter())
            .any(|(a, b)| a.importance != b.importance || a.name != b.name));
    }

    #[test]
    fn features_are_sorted_ranked_and_bounded() {
        let s = FallbackSynthesizer::default();
        for country in ["cn", "global", "xx"] {
            let f = s.features(country);
            assert_eq!(f.len(), ENERGY_FEATURES.len());
            for (i, r) in f.iter().enumerate() {
                assert_eq!(r.rank, i + 1);
                assert!(r.importance >= 1.0 - 1e-9 && r.importance <= 99.0 + 1e-9);
            }
            assert!(f.windows(2).all(|w| w[0].importance >= w[1].importance));
        }
    }

    #[test]
    fn seed_is_case_insensitive() {
        assert_eq!(country_seed("TR"), country_seed("tr"));
        assert_eq!(country_seed("ab"), 97 + 98);
    }

    #[test]
    fn series_cover_window_and_stay_in_range() {
        let s = FallbackSynthesizer::new(2000..=2023);
        let pts = s.series_points("Türkiye");
        assert_eq!(pts.len(), 24);
        assert_eq!(pts[0].year, 2000);
        assert!(pts.iter().all(|p| matches!(p.value, Some(v) if (0.0..=100.0).contains(&v))));
        assert_eq!(s.series_points("Türkiye"), pts);
    }

    #[test]
    fn comparison_has_stats_per_country() {
        let s = FallbackSynthesizer::default();
        let c = s.comparison(&["Almanya".into(), "Fransa".into()]);
        assert_eq!(c.len(), 2);
        assert!(c.iter().all(|cs| cs.stats.mean.is_some() && cs.stats.trend.is_some()));
        assert_ne!(c[0].points, c[1].points);
    }

    #[test]
    fn prediction_appends_forecast_after_window() {
        let s = FallbackSynthesizer::default();
        let p = s.prediction("de", 3);
        let forecast: Vec<_> = p.iter().filter(|p| p.is_prediction).collect();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].year, 2024);
        assert!(forecast.iter().all(|f| f.lower.is_some() && f.upper.is_some()));
        assert_eq!(p.len(), 11 + 3);
    }

    #[test]
    fn overview_ranks_roster_without_global() {
        let s = FallbackSynthesizer::default();
        let o = s.overview();
        assert_eq!(o, s.overview());
        assert_eq!(o.global_stats.total_countries, Some(10));
        assert_eq!(o.global_stats.years_range.as_deref(), Some("2013 - 2023"));
        assert_eq!(o.top_countries.len(), 5);
        assert!(o.top_countries.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(o.bottom_countries.windows(2).all(|w| w[0].value <= w[1].value));
        assert!(o.top_countries.iter().all(|c| c.country != "Global"));
        let (min, max) = (o.global_stats.min.unwrap(), o.global_stats.max.unwrap());
        assert!(min <= o.global_stats.mean.unwrap() && o.global_stats.mean.unwrap() <= max);
    }

    #[test]
    fn model_metrics_are_seeded_per_country() {
        let s = FallbackSynthesizer::default();
        let tr = s.model_metrics(Some("tr"));
        assert_eq!(tr, s.model_metrics(Some("tr")));
        assert_ne!(tr.r2, s.model_metrics(Some("de")).r2);
        let global = s.model_metrics(None);
        assert_eq!(global.country, None);
        assert_eq!(global.features.len(), MODEL_INPUTS.len());
        for m in [&tr, &global] {
            let r2 = m.r2.unwrap();
            assert!((0.6..=0.9).contains(&r2));
            assert_eq!(m.quality.as_deref(), Some(model_quality(r2)));
            assert!(m.rmse.unwrap() > m.mae.unwrap());
        }
    }
}
