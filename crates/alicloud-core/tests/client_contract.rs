//! Contract Test: HTTP Client Error Classification
//!
//! Verifies that responses from a (mocked) Alicloud endpoint are decoded
//! into classified errors, so the waiter can tell "missing" from "retry"
//! from "give up" without looking at message text.

use alicloud_core::client::{AcsClient, Credentials};
use alicloud_core::error::{Error, ErrorClass};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, token: Option<&str>) -> AcsClient {
    AcsClient::new(
        server.uri(),
        "cn-hangzhou",
        Credentials::new("LTAI_test", token.map(str::to_string)),
    )
    .expect("client builds")
}

#[tokio::test]
async fn rpc_sends_common_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("Action=GetLoginProfile"))
        .and(body_string_contains("Version=2015-05-01"))
        .and(body_string_contains("Format=JSON"))
        .and(body_string_contains("RegionId=cn-hangzhou"))
        .and(body_string_contains("SecurityToken=sts-token"))
        .and(body_string_contains("UserName=user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-1",
            "LoginProfile": { "UserName": "user-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server, Some("sts-token"))
        .rpc(
            "2015-05-01",
            "GetLoginProfile",
            &[("UserName", "user-1".to_string())],
        )
        .await
        .expect("call succeeds");

    assert_eq!(body["LoginProfile"]["UserName"], "user-1");
}

#[tokio::test]
async fn rpc_not_found_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "RequestId": "req-2",
            "Code": "EntityNotExist.User.LoginProfile",
            "Message": "The login policy not exists."
        })))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .rpc("2015-05-01", "GetLoginProfile", &[])
        .await
        .expect_err("call fails");

    assert_eq!(err.class(), ErrorClass::NotFound);
    assert_eq!(err.code(), Some("EntityNotExist.User.LoginProfile"));
}

#[tokio::test]
async fn rpc_throttling_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Code": "Throttling.User",
            "Message": "Request was denied due to user flow control."
        })))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .rpc("2015-05-01", "GetLoginProfile", &[])
        .await
        .expect_err("call fails");

    assert!(err.is_transient());
}

#[tokio::test]
async fn roa_sends_credentials_as_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2016-08-15/services/svc/functions/fn"))
        .and(header("x-acs-accesskey-id", "LTAI_test"))
        .and(header("x-acs-region-id", "cn-hangzhou"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "functionName": "fn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server, None)
        .roa(Method::GET, "/2016-08-15/services/svc/functions/fn", None)
        .await
        .expect("call succeeds");

    assert_eq!(body["functionName"], "fn");
}

#[tokio::test]
async fn roa_empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = client(&server, None)
        .roa(Method::DELETE, "/2016-08-15/services/svc/functions/fn", None)
        .await
        .expect("call succeeds");

    assert!(body.is_null());
}

#[tokio::test]
async fn roa_server_error_without_code_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .roa(Method::GET, "/2016-08-15/services/svc/functions/fn", None)
        .await
        .expect_err("call fails");

    assert!(err.is_transient());
    assert!(matches!(err, Error::Api { .. }));
}

#[tokio::test]
async fn connection_failure_is_transient() {
    // Nothing listens on the mock server once it is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = AcsClient::new(uri, "cn-hangzhou", Credentials::new("LTAI_test", None))
        .expect("client builds");

    let err = client
        .rpc("2015-05-01", "GetLoginProfile", &[])
        .await
        .expect_err("call fails");

    assert!(matches!(err, Error::Http(_)));
    assert!(err.is_transient());
}
