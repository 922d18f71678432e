//! # Data Model Scenario
//!
//! The canonical three-attribute model (required string, optional string,
//! defaulted integer) under each unknown-key policy and under
//! `hide_unset`.

use std::sync::Arc;

use serde_json::json;
use smodel_core::{
    AttributeDescriptor, CastFailure, Caster, ConstructionError, FieldError, ModelError,
    ModelPolicy, ModelSchema, UnknownPolicy,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn construction_error(err: ModelError) -> ConstructionError {
    match err {
        ModelError::Construction(e) => e,
        other => panic!("Expected Construction, got: {other}"),
    }
}

fn data(policy: ModelPolicy) -> anyhow::Result<Arc<ModelSchema>> {
    Ok(ModelSchema::new("Data")
        .with_policy(policy)
        .attribute(AttributeDescriptor::new("name", Caster::String))?
        .attribute(AttributeDescriptor::new("some_value", Caster::String).optional())?
        .attribute(AttributeDescriptor::new("another_value", Caster::Integer).default(0))?
        .shared())
}

#[test]
fn test_minimal_input_fills_optional_and_default() -> anyhow::Result<()> {
    init_tracing();
    let instance = data(ModelPolicy::default())?.construct_json(&json!({"name": "test"}))?;
    assert_eq!(
        instance.to_string(),
        r#"{"name":"test","some_value":null,"another_value":0}"#
    );
    assert!(instance.get("some_value")?.is_none());
    Ok(())
}

#[test]
fn test_hide_unset_omits_optional() -> anyhow::Result<()> {
    init_tracing();
    let instance = data(ModelPolicy::default().hide_unset(true))?
        .construct_json(&json!({"name": "test"}))?;
    assert_eq!(instance.project(), json!({"name": "test", "another_value": 0}));
    assert_eq!(instance.keys(), vec!["name", "another_value"]);
    Ok(())
}

#[test]
fn test_ignore_policy_accepts_unknown_keys() -> anyhow::Result<()> {
    init_tracing();
    let instance = data(ModelPolicy::default())?
        .construct_json(&json!({"name": "test", "another_value": 3, "unknown": true}))?;
    assert_eq!(
        instance.to_string(),
        r#"{"name":"test","some_value":null,"another_value":3}"#
    );
    assert!(instance.extras().contains_key("unknown"));
    Ok(())
}

#[test]
fn test_strict_policy_reports_unknown_key() -> anyhow::Result<()> {
    init_tracing();
    let err = data(ModelPolicy::default().unknown(UnknownPolicy::Strict))?
        .construct_json(&json!({"name": "test", "another_value": 3, "unknown": true}))
        .unwrap_err();
    let err = construction_error(err);
    assert_eq!(err.model, "Data");
    assert_eq!(err.errors.len(), 1);
    assert!(matches!(
        &err.errors.errors()[0],
        FieldError::UnknownField { key, value } if key == "unknown" && value == "true"
    ));
    Ok(())
}

#[test]
fn test_missing_required_is_single_entry() -> anyhow::Result<()> {
    init_tracing();
    let err = data(ModelPolicy::default())?
        .construct_json(&json!({"another_value": 1}))
        .unwrap_err();
    let err = construction_error(err);
    assert_eq!(err.errors.len(), 1);
    let entry = &err.errors.errors()[0];
    assert_eq!(entry.field(), Some("name"));
    assert_eq!(entry.value(), "<missing>");
    assert!(matches!(entry, FieldError::Cast(e) if matches!(e.failure, CastFailure::Missing)));
    Ok(())
}

#[test]
fn test_three_invalid_fields_three_entries() -> anyhow::Result<()> {
    init_tracing();
    let err = data(ModelPolicy::default().unknown(UnknownPolicy::Strict))?
        .construct_json(&json!({"name": null, "another_value": "many", "extra": 1}))
        .unwrap_err();
    let err = construction_error(err);
    let fields: Vec<Option<&str>> = err.errors.iter().map(FieldError::field).collect();
    assert_eq!(fields, vec![Some("name"), Some("another_value"), None]);
    let message = err.to_string();
    assert!(message.contains("3 error(s)"));
    assert!(message.contains("another_value: integer, default=0"));
    Ok(())
}

#[test]
fn test_round_trip_through_projection() -> anyhow::Result<()> {
    init_tracing();
    let schema = data(ModelPolicy::default())?;
    let first = schema.construct_json(&json!({"name": "x", "some_value": "y", "another_value": 7}))?;
    let second = schema.construct_json(&first.project())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_minimal_instance_rebuilds_from_projection() -> anyhow::Result<()> {
    init_tracing();
    let schema = data(ModelPolicy::default())?;
    let first = schema.construct_json(&json!({"name": "test"}))?;
    assert_eq!(first.project()["some_value"], json!(null));
    let second = schema.construct_json(&first.project())?;
    assert!(second.get("some_value")?.is_none());
    assert!(!second.contains("some_value"));
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_serialize_matches_projection() -> anyhow::Result<()> {
    init_tracing();
    let instance = data(ModelPolicy::default())?.construct_json(&json!({"name": "test"}))?;
    assert_eq!(serde_json::to_value(&instance)?, instance.project());
    Ok(())
}
