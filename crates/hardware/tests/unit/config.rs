//! Configuration Unit Tests.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;

use simcache_core::common::ConfigError;
use simcache_core::config::{Config, EvictionPolicy, MemoryController, PolicySelection};

#[test]
fn defaults_describe_a_4k_lru_cache() {
    let config = Config::default();
    let params = config.cache_params().unwrap();
    assert_eq!(params.block_size, 64);
    assert_eq!(params.capacity, 64);
    assert_eq!(params.policy, EvictionPolicy::Lru);
    assert_eq!(params.cpu_ports, 1);
    assert_eq!(params.clock_period, 1000);
    assert_eq!(config.memory.controller, MemoryController::Simple);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_object_takes_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.cache.size_bytes, 4096);
    assert_eq!(config.memory.queue_depth, 16);
}

#[test]
fn full_config_parses() {
    let json = r#"{
        "system": { "clock_period": 250, "cache_line_size": 16 },
        "cache": { "latency": 3, "size_bytes": 256, "policy": ["filo"], "cpu_ports": 4, "seed": 9 },
        "memory": { "controller": "DRAM", "t_cas": 10, "t_ras": 11, "t_pre": 12, "queue_depth": 2 }
    }"#;
    let config = Config::from_json(json).unwrap();
    let params = config.cache_params().unwrap();
    assert_eq!(params.capacity, 16);
    assert_eq!(params.latency, 3);
    assert_eq!(params.policy, EvictionPolicy::Filo);
    assert_eq!(params.cpu_ports, 4);
    assert_eq!(params.seed, 9);
    assert_eq!(config.memory.controller, MemoryController::Dram);
    assert_eq!(
        (config.memory.t_cas, config.memory.t_ras, config.memory.t_pre),
        (10, 11, 12)
    );
}

#[rstest]
#[case("\"FIFO\"", EvictionPolicy::Fifo)]
#[case("\"lru\"", EvictionPolicy::Lru)]
#[case("\"Random\"", EvictionPolicy::Random)]
#[case("[\"SEQUENTIAL\"]", EvictionPolicy::Sequential)]
fn policy_spellings(#[case] policy: &str, #[case] expected: EvictionPolicy) {
    let json = format!(r#"{{ "cache": {{ "policy": {policy} }} }}"#);
    let config = Config::from_json(&json).unwrap();
    assert_eq!(config.cache.policy.resolve().unwrap(), expected);
}

#[rstest]
#[case("[]", 0)]
#[case("[\"FIFO\", \"LRU\"]", 2)]
fn policy_list_must_name_exactly_one(#[case] policy: &str, #[case] count: usize) {
    let json = format!(r#"{{ "cache": {{ "policy": {policy} }} }}"#);
    assert!(matches!(
        Config::from_json(&json),
        Err(ConfigError::PolicyCount(n)) if n == count
    ));
}

#[test]
fn policy_from_str() {
    assert_eq!("filo".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Filo);
    assert!(matches!(
        "mru".parse::<EvictionPolicy>(),
        Err(ConfigError::UnknownPolicy(name)) if name == "mru"
    ));
    assert_eq!(EvictionPolicy::Sequential.to_string(), "SEQUENTIAL");
    assert_eq!(
        PolicySelection::from(EvictionPolicy::Fifo).resolve().unwrap(),
        EvictionPolicy::Fifo
    );
}

#[test]
fn unknown_policy_name_is_a_parse_error() {
    let json = r#"{ "cache": { "policy": "MRU" } }"#;
    assert!(matches!(Config::from_json(json), Err(ConfigError::Parse(_))));
}

#[rstest]
#[case(r#"{ "system": { "cache_line_size": 48 } }"#)]
#[case(r#"{ "system": { "cache_line_size": 0 } }"#)]
fn bad_line_size(#[case] json: &str) {
    assert!(matches!(Config::from_json(json), Err(ConfigError::BadLineSize(_))));
}

#[test]
fn validation_errors() {
    assert!(matches!(
        Config::from_json(r#"{ "system": { "clock_period": 0 } }"#),
        Err(ConfigError::ZeroClockPeriod)
    ));
    assert!(matches!(
        Config::from_json(r#"{ "cache": { "size_bytes": 32 } }"#),
        Err(ConfigError::CapacityTooSmall { size_bytes: 32, line_size: 64 })
    ));
    assert!(matches!(
        Config::from_json(r#"{ "cache": { "cpu_ports": 0 } }"#),
        Err(ConfigError::NoCpuPorts)
    ));
    assert!(matches!(
        Config::from_json(r#"{ "memory": { "queue_depth": 0 } }"#),
        Err(ConfigError::ZeroQueueDepth)
    ));
    assert!(matches!(Config::from_json("{ nope"), Err(ConfigError::Parse(_))));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "cache": {{ "size_bytes": 1024, "policy": "FIFO" }} }}"#).unwrap();
    let config = Config::from_file(file.path()).unwrap();
    let params = config.cache_params().unwrap();
    assert_eq!(params.capacity, 16);
    assert_eq!(params.policy, EvictionPolicy::Fifo);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(&err, ConfigError::Io { path: p, .. } if *p == path));
    assert!(err.to_string().contains("absent.json"));
}
