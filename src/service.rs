use serde_json::Value;
use std::sync::Arc;

use crate::endpoints::endpoints_for;
use crate::error::{ResolveError, TransportError};
use crate::fallback::FallbackSynthesizer;
use crate::logging::{log, log_fallback, obj, v_str, Domain, Level};
use crate::models::{
    CountryRecord, CountrySeries, FeatureImportanceRecord, ModelMetrics, Overview,
    PredictionPoint, Resolution, ResolutionResult, Resource, TimeSeriesPoint,
};
use crate::normalize::{
    normalize_comparison, normalize_countries, normalize_features, normalize_model_metrics,
    normalize_overview, normalize_points, normalize_prediction,
};
use crate::notify::{LogNotifier, Notifier, Severity};
use crate::resolver::EndpointResolver;
use crate::state::Config;
use crate::transport::{HttpTransport, Transport};

/// Resolve, normalize, or fall back: every method yields records.
///
/// A fallback result always comes with exactly one warning notification.
pub struct Dashboard {
    cfg: Config,
    resolver: EndpointResolver,
    notifier: Arc<dyn Notifier>,
    synth: FallbackSynthesizer,
}

impl Dashboard {
    pub fn new(cfg: Config, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        let resolver =
            EndpointResolver::new(transport).with_attempt_timeout(cfg.request_timeout());
        let synth = FallbackSynthesizer::new(cfg.fallback_years());
        Self {
            cfg,
            resolver,
            notifier,
            synth,
        }
    }

    /// HTTP transport against `cfg.api_base`, notifications to the log.
    pub fn from_config(cfg: Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&cfg)?;
        log(
            Level::Info,
            Domain::System,
            "dashboard_ready",
            obj(&[("api_base", v_str(transport.base().as_str()))]),
        );
        Ok(Self::new(cfg, Arc::new(transport), Arc::new(LogNotifier)))
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub async fn resolve(&self, resource: &Resource) -> Resolution {
        match resource {
            Resource::Countries => Resolution::Countries(self.countries().await),
            Resource::Overview => Resolution::Overview(self.overview().await),
            Resource::FeatureImportance { country } => {
                Resolution::FeatureImportance(self.feature_importance(country.as_deref()).await)
            }
            Resource::Comparison { countries } => {
                Resolution::Comparison(self.comparison(countries).await)
            }
            Resource::CountryDetail { country } => {
                Resolution::CountryDetail(self.country_detail(country).await)
            }
            Resource::Prediction { country, years } => {
                Resolution::Prediction(self.prediction(country, *years).await)
            }
            Resource::ModelMetrics { country } => {
                Resolution::ModelMetrics(self.model_metrics(country.as_deref()).await)
            }
        }
    }

    pub async fn countries(&self) -> ResolutionResult<CountryRecord> {
        let sort = self.cfg.sort_countries;
        self.run(
            &Resource::Countries,
            |payload| normalize_countries(payload, sort),
            || self.synth.countries(),
            "Country list unavailable; showing demo country list.".to_string(),
        )
        .await
    }

    pub async fn overview(&self) -> ResolutionResult<Overview> {
        self.run(
            &Resource::Overview,
            normalize_overview,
            || vec![self.synth.overview()],
            "Overview data unavailable; showing demo summary.".to_string(),
        )
        .await
    }

    /// `None` asks the unscoped routes for the dataset-wide ranking.
    pub async fn feature_importance(
        &self,
        country: Option<&str>,
    ) -> ResolutionResult<FeatureImportanceRecord> {
        let label = country.unwrap_or("global");
        self.run(
            &Resource::FeatureImportance {
                country: country.map(str::to_string),
            },
            normalize_features,
            || self.synth.features(label),
            format!("Feature importance for {} unavailable; showing demo values.", label),
        )
        .await
    }

    pub async fn comparison(&self, countries: &[String]) -> ResolutionResult<CountrySeries> {
        self.run(
            &Resource::Comparison {
                countries: countries.to_vec(),
            },
            |payload| normalize_comparison(payload, countries),
            || self.synth.comparison(countries),
            "Comparison data unavailable; showing demo series.".to_string(),
        )
        .await
    }

    pub async fn country_detail(&self, country: &str) -> ResolutionResult<TimeSeriesPoint> {
        self.run(
            &Resource::CountryDetail {
                country: country.to_string(),
            },
            normalize_points,
            || self.synth.country_detail(country),
            format!("Data for {} unavailable; showing demo series.", country),
        )
        .await
    }

    pub async fn prediction(
        &self,
        country: &str,
        years: u32,
    ) -> ResolutionResult<PredictionPoint> {
        self.run(
            &Resource::Prediction {
                country: country.to_string(),
                years,
            },
            normalize_prediction,
            || self.synth.prediction(country, years),
            format!("Prediction for {} unavailable; showing demo forecast.", country),
        )
        .await
    }

    /// `None` asks for the dataset-wide model.
    pub async fn model_metrics(&self, country: Option<&str>) -> ResolutionResult<ModelMetrics> {
        self.run(
            &Resource::ModelMetrics {
                country: country.map(str::to_string),
            },
            normalize_model_metrics,
            || vec![self.synth.model_metrics(country)],
            format!(
                "Model metrics for {} unavailable; showing demo metrics.",
                country.unwrap_or("global")
            ),
        )
        .await
    }

    async fn run<T, N, S>(
        &self,
        resource: &Resource,
        normalize: N,
        synthesize: S,
        message: String,
    ) -> ResolutionResult<T>
    where
        N: FnOnce(&Value) -> Result<Vec<T>, ResolveError>,
        S: FnOnce() -> Vec<T>,
    {
        let kind = resource.kind();
        let endpoints = endpoints_for(resource, &self.cfg);

        let outcome = match self.resolver.resolve(kind, &endpoints).await {
            Ok(resolved) => {
                normalize(&resolved.payload).map(|records| (records, resolved.endpoint_used))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok((records, endpoint)) => ResolutionResult::api(records, endpoint),
            Err(e) => {
                let records = synthesize();
                log_fallback(kind, e.cause(), records.len());
                log(
                    Level::Debug,
                    Domain::Fallback,
                    "fallback_cause",
                    obj(&[("resource", v_str(kind)), ("detail", v_str(&e.to_string()))]),
                );
                self.notifier.notify(&message, Severity::Warning);
                ResolutionResult::fallback(records)
            }
        }
    }
}
