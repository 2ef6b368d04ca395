//! Contract Test: Function Compute REST API
//!
//! Verifies the paths, methods and bodies `HttpFcApi` sends, against a
//! mocked Function Compute endpoint.

use std::collections::BTreeMap;

use alicloud_core::{AcsClient, Credentials};
use alicloud_fc::{CreateFunctionInput, FcApi, FunctionCode, HttpFcApi, UpdateFunctionInput};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> HttpFcApi {
    let client = AcsClient::new(server.uri(), "cn-shanghai", Credentials::new("LTAI_test", None))
        .expect("client builds");
    HttpFcApi::new(client)
}

fn function_body(memory_size: u32) -> serde_json::Value {
    json!({
        "functionId": "2d28e0e9-9ba5-4eed-8b1a-d3d9cd24e737",
        "functionName": "hello",
        "description": "tf",
        "handler": "hello.handler",
        "runtime": "python2.7",
        "memorySize": memory_size,
        "timeout": 3,
        "codeSize": 42,
        "lastModifiedTime": "2019-04-01T08:15:27Z"
    })
}

#[tokio::test]
async fn create_posts_function_to_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2016-08-15/services/svc/functions"))
        .and(body_json(json!({
            "functionName": "hello",
            "description": "tf",
            "handler": "hello.handler",
            "runtime": "python2.7",
            "memorySize": 128,
            "timeout": 3,
            "environmentVariables": {},
            "code": { "ossBucketName": "bucket", "ossObjectName": "fc/hello.zip" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(function_body(128)))
        .expect(1)
        .mount(&server)
        .await;

    let input = CreateFunctionInput {
        function_name: "hello".to_string(),
        description: "tf".to_string(),
        handler: "hello.handler".to_string(),
        runtime: "python2.7".to_string(),
        memory_size: 128,
        timeout: 3,
        environment_variables: BTreeMap::new(),
        code: FunctionCode::oss("bucket", "fc/hello.zip"),
    };

    let function = assert_ok!(api(&server).create_function("svc", &input).await);
    assert_eq!(function.code_size, 42);
}

#[tokio::test]
async fn update_puts_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/2016-08-15/services/svc/functions/hello"))
        .and(body_json(json!({ "memorySize": 512 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_body(512)))
        .expect(1)
        .mount(&server)
        .await;

    let input = UpdateFunctionInput {
        memory_size: Some(512),
        ..UpdateFunctionInput::default()
    };

    let function = assert_ok!(api(&server).update_function("svc", "hello", &input).await);
    assert_eq!(function.memory_size, 512);
}

#[tokio::test]
async fn get_of_missing_function_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2016-08-15/services/svc/functions/hello"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "ErrorCode": "FunctionNotFound",
            "ErrorMessage": "function 'hello' does not exist in service 'svc'"
        })))
        .mount(&server)
        .await;

    let err = assert_err!(api(&server).get_function("svc", "hello").await);
    assert!(err.is_not_found());
    assert_eq!(err.code(), Some("FunctionNotFound"));
}

#[tokio::test]
async fn get_decodes_function() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2016-08-15/services/svc/functions/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_body(128)))
        .mount(&server)
        .await;

    let function = assert_ok!(api(&server).get_function("svc", "hello").await);
    assert_eq!(function.function_name, "hello");
    assert_eq!(function.last_modified_time.as_deref(), Some("2019-04-01T08:15:27Z"));
}

#[tokio::test]
async fn delete_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/2016-08-15/services/svc/functions/hello"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(api(&server).delete_function("svc", "hello").await);
}

#[tokio::test]
async fn throttled_get_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ErrorCode": "ResourceThrottled",
            "ErrorMessage": "too many requests"
        })))
        .mount(&server)
        .await;

    let err = assert_err!(api(&server).get_function("svc", "hello").await);
    assert!(err.is_transient());
}
