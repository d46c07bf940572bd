use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::logging::log_stale_discard;

pub const DEFAULT_COUNTRY_ENDPOINTS: &[&str] = &[
    "/api/countries",
    "/api/data/countries",
    "/api/country-list",
    "/api/country_list",
];

pub const DEFAULT_FEATURE_ENDPOINTS: &[&str] = &[
    "/api/features/importance/{country}",
    "/api/feature-importance/{country}",
    "/api/feature_importance/{country}",
    "/api/feature-importance",
];

/// Unscoped routes for the dataset-wide ranking.
pub const DEFAULT_GLOBAL_FEATURE_ENDPOINTS: &[&str] = &[
    "/api/features/importance",
    "/api/feature-importance",
    "/api/feature_importance",
];

pub const DEFAULT_OVERVIEW_ENDPOINTS: &[&str] = &["/api/data/overview"];

pub const DEFAULT_MODEL_ENDPOINTS: &[&str] = &["/api/data/model"];

pub const DEFAULT_COMPARISON_ENDPOINTS: &[&str] = &["/api/data/comparison"];

pub const DEFAULT_DETAIL_ENDPOINTS: &[&str] = &["/api/data/country/{country}", "/api/country-data"];

pub const DEFAULT_PREDICTION_ENDPOINTS: &[&str] = &["/api/data/prediction/{country}"];

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    /// Per-attempt timeout; unset means no limit beyond the transport's own.
    pub request_timeout_ms: Option<u64>,
    pub user_agent: String,
    pub country_endpoints: Vec<String>,
    pub feature_endpoints: Vec<String>,
    pub global_feature_endpoints: Vec<String>,
    pub overview_endpoints: Vec<String>,
    pub model_endpoints: Vec<String>,
    pub comparison_endpoints: Vec<String>,
    pub detail_endpoints: Vec<String>,
    pub prediction_endpoints: Vec<String>,
    pub fallback_start_year: i32,
    pub fallback_end_year: i32,
    pub sort_countries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000".to_string(),
            request_timeout_ms: None,
            user_agent: format!("energydash/{}", env!("CARGO_PKG_VERSION")),
            country_endpoints: owned(DEFAULT_COUNTRY_ENDPOINTS),
            feature_endpoints: owned(DEFAULT_FEATURE_ENDPOINTS),
            global_feature_endpoints: owned(DEFAULT_GLOBAL_FEATURE_ENDPOINTS),
            overview_endpoints: owned(DEFAULT_OVERVIEW_ENDPOINTS),
            model_endpoints: owned(DEFAULT_MODEL_ENDPOINTS),
            comparison_endpoints: owned(DEFAULT_COMPARISON_ENDPOINTS),
            detail_endpoints: owned(DEFAULT_DETAIL_ENDPOINTS),
            prediction_endpoints: owned(DEFAULT_PREDICTION_ENDPOINTS),
            fallback_start_year: 2013,
            fallback_end_year: 2023,
            sort_countries: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: std::env::var("API_BASE").unwrap_or(d.api_base),
            request_timeout_ms: parse_env("REQUEST_TIMEOUT_MS"),
            user_agent: std::env::var("USER_AGENT").unwrap_or(d.user_agent),
            country_endpoints: list_env("COUNTRY_ENDPOINTS").unwrap_or(d.country_endpoints),
            feature_endpoints: list_env("FEATURE_ENDPOINTS").unwrap_or(d.feature_endpoints),
            global_feature_endpoints: list_env("GLOBAL_FEATURE_ENDPOINTS")
                .unwrap_or(d.global_feature_endpoints),
            overview_endpoints: list_env("OVERVIEW_ENDPOINTS").unwrap_or(d.overview_endpoints),
            model_endpoints: list_env("MODEL_ENDPOINTS").unwrap_or(d.model_endpoints),
            comparison_endpoints: list_env("COMPARISON_ENDPOINTS")
                .unwrap_or(d.comparison_endpoints),
            detail_endpoints: list_env("DETAIL_ENDPOINTS").unwrap_or(d.detail_endpoints),
            prediction_endpoints: list_env("PREDICTION_ENDPOINTS")
                .unwrap_or(d.prediction_endpoints),
            fallback_start_year: parse_env("FALLBACK_START_YEAR")
                .unwrap_or(d.fallback_start_year),
            fallback_end_year: parse_env("FALLBACK_END_YEAR").unwrap_or(d.fallback_end_year),
            sort_countries: std::env::var("SORT_COUNTRIES")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(d.sort_countries),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Inclusive year window used for synthesized series.
    pub fn fallback_years(&self) -> std::ops::RangeInclusive<i32> {
        let (start, end) = if self.fallback_start_year <= self.fallback_end_year {
            (self.fallback_start_year, self.fallback_end_year)
        } else {
            (self.fallback_end_year, self.fallback_start_year)
        };
        start..=end
    }
}

fn owned(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn list_env(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

// =============================================================================
// Per-view state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Overview,
    Country,
    Comparison,
    Features,
    Model,
    Prediction,
}

impl ViewId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::Overview => "overview",
            ViewId::Country => "country",
            ViewId::Comparison => "comparison",
            ViewId::Features => "features",
            ViewId::Model => "model",
            ViewId::Prediction => "prediction",
        }
    }
}

/// Issued by [`ViewSlot::begin`]; only the latest token may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    view: ViewId,
    generation: u64,
}

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The dataset currently rendered by one view.
///
/// Each new selection calls `begin`; a resolution that finishes after a
/// newer one was started is discarded on `commit`.
#[derive(Debug)]
pub struct ViewSlot<T> {
    view: ViewId,
    generation: AtomicU64,
    current: Mutex<Option<(u64, T)>>,
}

impl<T: Clone> ViewSlot<T> {
    pub fn new(view: ViewId) -> Self {
        Self {
            view,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn begin(&self) -> RequestToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken {
            view: self.view,
            generation,
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.view == self.view && token.generation == self.generation.load(Ordering::SeqCst)
    }

    /// Stores `data` if `token` is still the latest. Returns whether it was kept.
    pub fn commit(&self, token: RequestToken, data: T) -> bool {
        let latest = self.generation.load(Ordering::SeqCst);
        if !self.is_current(token) {
            log_stale_discard(self.view.as_str(), token.generation, latest);
            return false;
        }
        match self.current.lock() {
            Ok(mut slot) => {
                *slot = Some((token.generation, data));
                true
            }
            Err(_) => false,
        }
    }

    pub fn current(&self) -> Option<T> {
        self.current
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|(_, data)| data.clone()))
    }

    /// Generation of the rendered dataset, if any.
    pub fn rendered_generation(&self) -> Option<u64> {
        self.current
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|(g, _)| *g))
    }
}

/// Countries picked in the comparison view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    countries: Vec<String>,
}

impl ComparisonSelection {
    pub const MIN_COUNTRIES: usize = 2;
    pub const MAX_COUNTRIES: usize = 5;

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Adds a country unless already selected (case-insensitive) or full.
    pub fn add(&mut self, country: &str) -> bool {
        let country = country.trim();
        if country.is_empty()
            || self.countries.len() >= Self::MAX_COUNTRIES
            || self.countries.iter().any(|c| c.to_lowercase() == country.to_lowercase())
        {
            return false;
        }
        self.countries.push(country.to_string());
        true
    }

    pub fn remove(&mut self, country: &str) -> bool {
        let before = self.countries.len();
        self.countries.retain(|c| c != country);
        before != self.countries.len()
    }

    pub fn clear(&mut self) {
        self.countries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// A comparison needs at least two countries.
    pub fn is_ready(&self) -> bool {
        self.countries.len() >= Self::MIN_COUNTRIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_cover_all_country_paths() {
        let cfg = Config::default();
        assert_eq!(cfg.country_endpoints[0], "/api/countries");
        assert_eq!(cfg.country_endpoints.len(), 4);
        assert!(cfg.request_timeout().is_none());
    }

    #[test]
    fn fallback_years_are_ordered() {
        let mut cfg = Config::default();
        cfg.fallback_start_year = 2020;
        cfg.fallback_end_year = 2015;
        assert_eq!(cfg.fallback_years(), 2015..=2020);
    }

    #[test]
    fn stale_commit_is_discarded() {
        let slot: ViewSlot<&str> = ViewSlot::new(ViewId::Comparison);
        let first = slot.begin();
        let second = slot.begin();
        assert!(slot.commit(second, "new"));
        assert!(!slot.commit(first, "old"));
        assert_eq!(slot.current(), Some("new"));
        assert_eq!(slot.rendered_generation(), Some(second.generation()));
    }

    #[test]
    fn latest_token_commits_even_when_older_never_returns() {
        let slot: ViewSlot<u32> = ViewSlot::new(ViewId::Country);
        let _abandoned = slot.begin();
        let t = slot.begin();
        assert!(slot.is_current(t));
        assert!(slot.commit(t, 7));
        assert_eq!(slot.current(), Some(7));
    }

    #[test]
    fn selection_rejects_duplicates_and_caps_size() {
        let mut sel = ComparisonSelection::default();
        assert!(sel.add("Almanya"));
        assert!(!sel.is_ready());
        assert!(!sel.add("almanya"));
        for c in ["Fransa", "Çin", "Japonya", "Rusya"] {
            assert!(sel.add(c));
        }
        assert!(!sel.add("Brezilya"));
        assert!(sel.is_ready());
        assert!(sel.remove("Çin"));
        assert_eq!(sel.countries().len(), 4);
    }
}
