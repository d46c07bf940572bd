//! File sink under `LOG_DIR`. Kept to a single test: the run context is
//! initialised once per process.

use energydash::logging::{log_fallback, obj, run_dir, v_str, Domain, Level};
use serde_json::Value;

#[test]
fn events_land_in_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", dir.path());
    std::env::set_var("RUN_ID", "sink-test");
    std::env::remove_var("LOG_DOMAINS");
    std::env::remove_var("LOG_LEVEL");

    log_fallback("countries", "resolution_exhausted", 11);
    energydash::logging::log(
        Level::Info,
        Domain::System,
        "sink_check",
        obj(&[("token", v_str("secret")), ("msg", v_str("hello"))]),
    );

    let run = run_dir().expect("file logging enabled");
    assert_eq!(run, dir.path().join("sink-test"));
    assert!(run.join("manifest.json").exists());

    let events = std::fs::read_to_string(run.join("events.jsonl")).unwrap();
    let lines: Vec<Value> = events
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["event"], "fallback_served");
    assert_eq!(lines[0]["component"], "fallback");
    assert_eq!(lines[0]["resource"], "countries");
    assert_eq!(lines[0]["data"]["records"], 11);
    assert_eq!(lines[0]["run_id"], "sink-test");

    assert_eq!(lines[1]["msg"], "hello");
    assert_eq!(lines[1]["data"]["token"], "[REDACTED]");
    assert!(lines[1]["seq"].as_u64() > lines[0]["seq"].as_u64());
}
