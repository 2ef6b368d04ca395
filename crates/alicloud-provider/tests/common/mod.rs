//! Test harness for provider acceptance tests
//!
//! Builds a provider over the in-memory RAM and Function Compute APIs,
//! seeded with the dependencies the scenarios need: a RAM user, an FC
//! service and an OSS object holding the function code.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alicloud_core::WaitBudget;
use alicloud_fc::MemoryFcApi;
use alicloud_provider::{AlicloudProvider, InstanceState, ProviderClients};
use alicloud_ram::MemoryRamApi;
use serde_json::{Value, json};

pub const USER: &str = "tf-testacc-user";
pub const SERVICE: &str = "tf-testaccalicloudfcfunction-service";
pub const BUCKET: &str = "tf-testaccalicloudfcfunction-bucket";
pub const OBJECT: &str = "fc/hello.zip";

const HANDLER_SOURCE: &str = r#"# -*- coding: utf-8 -*-
def handler(event, context):
    print "hello world"
    return 'hello world'
"#;

pub struct Harness {
    pub ram: Arc<MemoryRamApi>,
    pub fc: Arc<MemoryFcApi>,
    pub provider: Arc<AlicloudProvider>,
}

/// Same defaults as the provider: 60s timeout, 5s between polls
pub fn budget() -> WaitBudget {
    WaitBudget::new(Duration::from_secs(60), Duration::from_secs(5)).expect("valid budget")
}

pub async fn harness(propagation_polls: u32) -> Harness {
    let ram = Arc::new(MemoryRamApi::new(propagation_polls));
    ram.add_user(USER).await;

    let fc = Arc::new(MemoryFcApi::new(propagation_polls));
    fc.add_service(SERVICE).await;
    fc.put_object(BUCKET, OBJECT, HANDLER_SOURCE.as_bytes().to_vec())
        .await;

    let provider = AlicloudProvider::new(ProviderClients::new(ram.clone(), fc.clone()), budget());
    Harness {
        ram,
        fc,
        provider: Arc::new(provider),
    }
}

/// Basic function configuration
pub fn fc_basic_config(name: &str) -> Value {
    json!({
        "service": SERVICE,
        "name": name,
        "runtime": "python2.7",
        "description": "tf",
        "handler": "hello.handler",
        "oss_bucket": BUCKET,
        "oss_key": OBJECT
    })
}

/// Copy of `base` with the fields of `changes` set
pub fn with(base: &Value, changes: Value) -> Value {
    let mut merged = base.clone();
    if let (Some(target), Some(fields)) = (merged.as_object_mut(), changes.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Assert that every listed attribute has the expected value
pub fn assert_attributes(state: &InstanceState, expected: &Value) {
    let expected = expected.as_object().expect("expected attributes are an object");
    for (key, value) in expected {
        assert_eq!(
            state.attribute(key),
            Some(value),
            "attribute {key} of {}",
            state.id
        );
    }
}

/// Assert that two states agree on every attribute except `ignore`
pub fn assert_same_attributes(actual: &InstanceState, expected: &InstanceState, ignore: &[&str]) {
    for (key, value) in &expected.attributes {
        if ignore.contains(&key.as_str()) {
            continue;
        }
        assert_eq!(actual.attribute(key), Some(value), "attribute {key}");
    }
}
