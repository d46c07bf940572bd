//! End-to-end resolution through `Dashboard` with a scripted transport.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use energydash::endpoints::Endpoint;
use energydash::fallback::FallbackSynthesizer;
use energydash::models::Source;
use energydash::notify::RecordingNotifier;
use energydash::state::{Config, ViewId, ViewSlot};
use energydash::transport::Transport;
use energydash::{Dashboard, Severity, TransportError};

/// Replies by endpoint label; anything unscripted is a 404.
struct ScriptedTransport {
    replies: Vec<(String, Result<Value, TransportError>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<(&str, Result<Value, TransportError>)>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.into_iter().map(|(l, r)| (l.to_string(), r)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, TransportError> {
        let label = endpoint.label();
        self.calls.lock().unwrap().push(label.clone());
        self.replies
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, r)| r.clone())
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

fn dashboard(
    cfg: Config,
    transport: Arc<ScriptedTransport>,
) -> (Dashboard, Arc<RecordingNotifier>) {
    let notes = Arc::new(RecordingNotifier::new());
    (Dashboard::new(cfg, transport, notes.clone()), notes)
}

#[tokio::test]
async fn all_country_endpoints_failing_yields_roster_and_one_warning() {
    let t = ScriptedTransport::new(vec![
        ("/api/countries", Err(TransportError::Status(500))),
        ("/api/data/countries", Err(TransportError::Status(500))),
        ("/api/country-list", Err(TransportError::Status(500))),
        ("/api/country_list", Err(TransportError::Status(500))),
    ]);
    let (d, notes) = dashboard(Config::default(), t.clone());

    let r = d.countries().await;
    assert_eq!(r.source, Source::Fallback);
    assert_eq!(r.endpoint_used, None);
    assert_eq!(r.records, FallbackSynthesizer::default().countries());
    assert_eq!(t.calls().len(), 4);

    let seen = notes.notifications();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, Severity::Warning);
    assert!(seen[0].0.contains("Country list"));
}

#[tokio::test]
async fn bare_string_countries_are_sorted() {
    let t = ScriptedTransport::new(vec![(
        "/api/countries",
        Ok(json!({"countries": ["Türkiye", "Almanya"]})),
    )]);
    let (d, notes) = dashboard(Config::default(), t);

    let r = d.countries().await;
    assert_eq!(r.source, Source::Api);
    assert_eq!(r.endpoint_used.as_deref(), Some("/api/countries"));
    let names: Vec<_> = r.records.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, vec!["Almanya", "Türkiye"]);
    assert_eq!(r.records[0].code, "Almanya");
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn sorting_can_be_disabled() {
    let t = ScriptedTransport::new(vec![(
        "/api/countries",
        Ok(json!(["Türkiye", "Almanya"])),
    )]);
    let cfg = Config {
        sort_countries: false,
        ..Config::default()
    };
    let (d, _) = dashboard(cfg, t);
    let r = d.countries().await;
    assert_eq!(r.records[0].display_name, "Türkiye");
}

#[tokio::test]
async fn fractional_importance_becomes_percent() {
    let t = ScriptedTransport::new(vec![(
        "/api/features/importance/tr",
        Ok(json!({"features": [{"feature": "Year", "value": 0.42}]})),
    )]);
    let (d, _) = dashboard(Config::default(), t);

    let r = d.feature_importance(Some("tr")).await;
    assert_eq!(r.source, Source::Api);
    assert_eq!(r.records.len(), 1);
    assert_eq!(r.records[0].name, "Year");
    assert!((r.records[0].importance - 42.0).abs() < 1e-9);
    assert_eq!(r.records[0].rank, 1);
}

#[tokio::test]
async fn later_candidates_are_not_attempted_after_success() {
    let t = ScriptedTransport::new(vec![
        (
            "/api/features/importance/de",
            Err(TransportError::Network("refused".into())),
        ),
        (
            "/api/feature-importance/de",
            Ok(json!([{"name": "Solar Energy Capacity", "importance": 12}])),
        ),
        (
            "/api/feature_importance/de",
            Ok(json!([{"name": "never", "importance": 1}])),
        ),
    ]);
    let (d, notes) = dashboard(Config::default(), t.clone());

    let r = d.feature_importance(Some("de")).await;
    assert_eq!(r.endpoint_used.as_deref(), Some("/api/feature-importance/de"));
    assert_eq!(r.records[0].importance, 12.0);
    assert_eq!(
        t.calls(),
        vec!["/api/features/importance/de", "/api/feature-importance/de"]
    );
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn failed_envelope_triggers_fallback() {
    let t = ScriptedTransport::new(vec![(
        "/api/data/comparison?countries=tr%2Cde",
        Ok(json!({"success": false, "error": "no data"})),
    )]);
    let (d, notes) = dashboard(Config::default(), t.clone());

    let countries = vec!["tr".to_string(), "de".to_string()];
    let r = d.comparison(&countries).await;
    assert_eq!(r.source, Source::Fallback);
    assert_eq!(r.records.len(), 2);
    assert_eq!(r.records[0].country, "tr");
    assert_eq!(t.calls().len(), 1);
    assert_eq!(notes.count(), 1);
}

#[tokio::test]
async fn germany_fallback_is_deterministic() {
    let t = ScriptedTransport::new(vec![]);
    let (d, notes) = dashboard(Config::default(), t);

    let first = d.feature_importance(Some("Germany")).await;
    let second = d.feature_importance(Some("Germany")).await;
    assert_eq!(first.records, second.records);
    assert_eq!(notes.count(), 2);

    let turkey = d.feature_importance(Some("Turkey")).await;
    assert_ne!(first.records, turkey.records);
}

#[tokio::test]
async fn enveloped_prediction_is_normalized() {
    let t = ScriptedTransport::new(vec![(
        "/api/data/prediction/tr?years=2",
        Ok(json!({
            "success": true,
            "data": {
                "historical": [{"year": 2022, "value": 20.0}, {"year": 2023, "value": 21.0}],
                "predictions": [
                    {"year": 2024, "value": 22.0},
                    {"year": 2025, "value": 23.0, "lower": 20.0, "upper": 26.0}
                ]
            }
        })),
    )]);
    let (d, notes) = dashboard(Config::default(), t);

    let r = d.prediction("tr", 2).await;
    assert_eq!(r.source, Source::Api, "records: {:?}", r.records);
    assert_eq!(r.records.iter().filter(|p| p.is_prediction).count(), 2);
    let last = r.records.last().unwrap();
    assert_eq!((last.year, last.lower, last.upper), (2025, Some(20.0), Some(26.0)));
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn stale_view_commit_is_discarded() {
    let t = ScriptedTransport::new(vec![]);
    let (d, _) = dashboard(Config::default(), t);
    let slot = ViewSlot::new(ViewId::Country);

    let old = slot.begin();
    let new = slot.begin();
    let fresh = d.country_detail("de").await;
    assert!(slot.commit(new, fresh.clone()));

    let late = d.country_detail("tr").await;
    assert!(!slot.commit(old, late));
    assert_eq!(slot.current(), Some(fresh));
    assert_eq!(slot.rendered_generation(), Some(new.generation()));
}

#[tokio::test]
async fn global_features_reach_unscoped_routes() {
    let t = ScriptedTransport::new(vec![
        (
            "/api/feature-importance",
            Ok(json!({"features": [{"name": "Year", "importance": 30}]})),
        ),
        (
            "/api/feature_importance",
            Ok(json!({"features": [{"name": "never", "importance": 1}]})),
        ),
    ]);
    let (d, notes) = dashboard(Config::default(), t.clone());

    let r = d.feature_importance(None).await;
    assert_eq!(r.source, Source::Api);
    assert_eq!(r.endpoint_used.as_deref(), Some("/api/feature-importance"));
    assert_eq!(r.records[0].name, "Year");
    assert_eq!(
        t.calls(),
        vec!["/api/features/importance", "/api/feature-importance"]
    );
    assert!(t.calls().iter().all(|c| !c.contains("global")));
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn overview_from_backend_envelope() {
    let t = ScriptedTransport::new(vec![(
        "/api/data/overview",
        Ok(json!({
            "success": true,
            "overview": {
                "highest_countries": [
                    {"country": "Norveç", "value": 98.5},
                    {"country": "İzlanda", "value": 99.1}
                ],
                "lowest_countries": [{"country": "Cezayir", "value": 0.3}],
                "global_stats": {
                    "mean": 31.2, "min": 0.3, "max": 99.1,
                    "total_countries": 3, "years_range": "2000 - 2023"
                }
            }
        })),
    )]);
    let (d, notes) = dashboard(Config::default(), t);

    let r = d.overview().await;
    assert_eq!(r.source, Source::Api);
    assert_eq!(r.endpoint_used.as_deref(), Some("/api/data/overview"));
    let overview = &r.records[0];
    assert_eq!(overview.top_countries[0].country, "İzlanda");
    assert_eq!(overview.bottom_countries[0].country, "Cezayir");
    assert_eq!(overview.global_stats.total_countries, Some(3));
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn overview_fallback_warns_once() {
    let t = ScriptedTransport::new(vec![]);
    let (d, notes) = dashboard(Config::default(), t);

    let r = d.overview().await;
    assert_eq!(r.source, Source::Fallback);
    assert_eq!(r.records, vec![FallbackSynthesizer::default().overview()]);
    assert_eq!(notes.count(), 1);
}

#[tokio::test]
async fn model_metrics_for_country_use_query() {
    let t = ScriptedTransport::new(vec![(
        "/api/data/model?country=tr",
        Ok(json!({
            "success": true,
            "metrics": {"r2": 0.91, "mae": 0.12, "rmse": 0.2},
            "model_quality": "good",
            "features": ["Year", "Solar Energy Capacity"]
        })),
    )]);
    let (d, notes) = dashboard(Config::default(), t.clone());

    let r = d.model_metrics(Some("tr")).await;
    assert_eq!(r.source, Source::Api);
    let m = &r.records[0];
    assert_eq!(m.r2, Some(0.91));
    assert_eq!(m.quality.as_deref(), Some("good"));
    assert_eq!(m.features.len(), 2);
    assert_eq!(t.calls(), vec!["/api/data/model?country=tr"]);
    assert_eq!(notes.count(), 0);
}

#[tokio::test]
async fn model_metrics_fallback_is_seeded_by_country() {
    let t = ScriptedTransport::new(vec![]);
    let (d, notes) = dashboard(Config::default(), t);

    let tr = d.model_metrics(Some("tr")).await;
    let again = d.model_metrics(Some("tr")).await;
    assert_eq!(tr.source, Source::Fallback);
    assert_eq!(tr.records, again.records);
    assert_eq!(tr.records, vec![FallbackSynthesizer::default().model_metrics(Some("tr"))]);
    assert_eq!(notes.count(), 2);
}
