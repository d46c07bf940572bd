//! Candidate endpoint lists per resource, expanded from path templates.

use url::form_urlencoded;
use url::Url;

use crate::error::TransportError;
use crate::models::Resource;
use crate::state::Config;

/// One concrete request: path segments plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Expands `{name}` placeholders from `params`. Parameters without a
    /// placeholder are appended as query parameters, in order.
    pub fn expand(template: &str, params: &[(&str, String)]) -> Self {
        let (path, literal_query) = match template.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (template, None),
        };

        let mut used: Vec<&str> = Vec::new();
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|seg| {
                let name = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}'));
                match name.and_then(|n| params.iter().find(|(k, _)| *k == n)) {
                    Some((k, v)) => {
                        used.push(*k);
                        v.clone()
                    }
                    None => seg.to_string(),
                }
            })
            .collect();

        let mut query: Vec<(String, String)> = literal_query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        for (k, v) in params {
            if !used.contains(k) {
                query.push((k.to_string(), v.clone()));
            }
        }

        Self { segments, query }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Human-readable relative URL, used in logs and `endpoint_used`.
    pub fn label(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            out.push('/');
            out.push_str(seg);
        }
        if out.is_empty() {
            out.push('/');
        }
        if !self.query.is_empty() {
            let qs = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            out.push('?');
            out.push_str(&qs);
        }
        out
    }

    /// Absolute URL under `base`, percent-encoding every segment.
    pub fn url(&self, base: &Url) -> Result<Url, TransportError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(base.to_string()))?;
            path.pop_if_empty();
            path.extend(self.segments.iter());
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered candidates for `resource` under `cfg`.
pub fn endpoints_for(resource: &Resource, cfg: &Config) -> Vec<Endpoint> {
    let templates = match resource {
        Resource::Countries => &cfg.country_endpoints,
        Resource::Overview => &cfg.overview_endpoints,
        Resource::FeatureImportance { country: Some(_) } => &cfg.feature_endpoints,
        Resource::FeatureImportance { country: None } => &cfg.global_feature_endpoints,
        Resource::ModelMetrics { .. } => &cfg.model_endpoints,
        Resource::Comparison { .. } => &cfg.comparison_endpoints,
        Resource::CountryDetail { .. } => &cfg.detail_endpoints,
        Resource::Prediction { .. } => &cfg.prediction_endpoints,
    };
    let params = resource.params();
    templates
        .iter()
        .map(|t| Endpoint::expand(t, &params))
        .collect()
}
