//! Resolves one resource against `API_BASE` and prints the canonical
//! records as JSON.
//!
//! Usage: energydash <countries | overview | features [country] | compare <c1,c2,..> |
//!                    country <id> | predict <id> [years] | model [country]>

use anyhow::{Context, Result};
use serde_json::json;

use energydash::logging::{json_log, obj, v_num, v_str};
use energydash::models::{Resolution, Resource};
use energydash::state::{ComparisonSelection, Config, ViewId, ViewSlot};
use energydash::Dashboard;

const USAGE: &str = "Usage: energydash <countries | overview | features [country] | \
                     compare <c1,c2,..> | country <id> | predict <id> [years] | model [country]>";
const DEFAULT_PREDICTION_YEARS: u32 = 5;

fn parse_args(args: &[String]) -> Result<Resource, String> {
    let arg = |i: usize| args.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());
    match arg(0) {
        Some("countries") => Ok(Resource::Countries),
        Some("overview") => Ok(Resource::Overview),
        Some("features") => Ok(Resource::FeatureImportance {
            country: arg(1).map(str::to_string),
        }),
        Some("compare") => {
            let mut selection = ComparisonSelection::default();
            for c in arg(1).unwrap_or_default().split(',') {
                selection.add(c);
            }
            if !selection.is_ready() {
                return Err(format!(
                    "compare needs {}..{} distinct countries",
                    ComparisonSelection::MIN_COUNTRIES,
                    ComparisonSelection::MAX_COUNTRIES
                ));
            }
            Ok(Resource::Comparison {
                countries: selection.countries().to_vec(),
            })
        }
        Some("country") => arg(1)
            .map(|c| Resource::CountryDetail {
                country: c.to_string(),
            })
            .ok_or_else(|| "country needs an id".to_string()),
        Some("predict") => {
            let country = arg(1).ok_or_else(|| "predict needs an id".to_string())?;
            let years = match arg(2) {
                Some(y) => y
                    .parse::<u32>()
                    .ok()
                    .filter(|y| *y > 0)
                    .ok_or_else(|| format!("invalid years: {}", y))?,
                None => DEFAULT_PREDICTION_YEARS,
            };
            Ok(Resource::Prediction {
                country: country.to_string(),
                years,
            })
        }
        Some("model") => Ok(Resource::ModelMetrics {
            country: arg(1).map(str::to_string),
        }),
        Some(other) => Err(format!("unknown command: {}", other)),
        None => Err("missing command".to_string()),
    }
}

/// The country list feeds every selector, so it has no view of its own.
fn view_for(resource: &Resource) -> Option<ViewId> {
    match resource {
        Resource::Countries => None,
        Resource::Overview => Some(ViewId::Overview),
        Resource::FeatureImportance { .. } => Some(ViewId::Features),
        Resource::Comparison { .. } => Some(ViewId::Comparison),
        Resource::CountryDetail { .. } => Some(ViewId::Country),
        Resource::Prediction { .. } => Some(ViewId::Prediction),
        Resource::ModelMetrics { .. } => Some(ViewId::Model),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let resource = match parse_args(&args) {
        Ok(r) => r,
        Err(reason) => {
            eprintln!("{}", reason);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let cfg = Config::from_env();
    let dashboard = Dashboard::from_config(cfg).context("building HTTP transport")?;

    let slot = view_for(&resource).map(ViewSlot::<Resolution>::new);
    let token = slot.as_ref().map(ViewSlot::begin);
    let resolution = dashboard.resolve(&resource).await;
    json_log(
        "resolved",
        obj(&[
            ("resource", v_str(resource.kind())),
            ("view", v_str(slot.as_ref().map_or("none", |s| s.view().as_str()))),
            ("source", v_str(resolution.source().as_str())),
            ("records", v_num(resolution.len() as f64)),
        ]),
    );

    let rendered = match (slot, token) {
        (Some(slot), Some(token)) => {
            slot.commit(token, resolution);
            slot.current().context("resolution was not committed")?
        }
        _ => resolution,
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    if rendered.is_empty() {
        json_log("resolved", obj(&[("warning", json!("empty_result"))]));
    }
    Ok(())
}
