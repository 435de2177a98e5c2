//! Unit tests for the control-plane client

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orchestrator::control_plane::{
    ApiResponse, ControlPlaneClient, Operation, OperationStatus, SignatureEntry,
};

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::{create_default_operation_request, DUMMY_EXECUTION_HASH, DUMMY_OPERATION_ID};

fn client(server: &MockServer) -> ControlPlaneClient {
    ControlPlaneClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

// ============================================================================
// JSON PARSING TESTS
// ============================================================================

/// What is tested: Operation deserialization with defaults applied
/// Why: signRequests, estimatedTimeSecs, and error are optional on the wire
#[test]
fn test_operation_deserialization_defaults() {
    let json = r#"{
        "id": "op-1111",
        "kind": "send",
        "status": "AWAITING_SIGNATURE"
    }"#;

    let operation: Operation = serde_json::from_str(json).unwrap();
    assert_eq!(operation.id, "op-1111");
    assert_eq!(operation.status, OperationStatus::AwaitingSignature);
    assert!(operation.sign_requests.is_empty());
    assert!(operation.estimated_time_secs.is_none());
    assert!(operation.error.is_none());
}

/// What is tested: sign request parsing, including the serverSide flag and
/// an embedded burn intent
/// Why: The engine's phase routing depends on these two fields
#[test]
fn test_sign_request_deserialization() {
    let json = json!({
        "id": "op-1111",
        "kind": "batch-send",
        "status": "AWAITING_SIGNATURE",
        "estimatedTimeSecs": 90,
        "signRequests": [
            {
                "id": "req-1",
                "domain": 6,
                "description": "Mint on destination",
                "kind": "mint",
                "serverSide": false,
                "calls": [],
                "burnIntent": {
                    "version": "1",
                    "sourceDomain": "1",
                    "destinationDomain": "6",
                    "sourceContract": "0x0000000000000000000000000000000000000001",
                    "destinationContract": "0x0000000000000000000000000000000000000002",
                    "sourceToken": "0x0000000000000000000000000000000000000003",
                    "destinationToken": "0x0000000000000000000000000000000000000004",
                    "sourceDepositor": "0x0000000000000000000000000000000000000005",
                    "destinationRecipient": "0x0000000000000000000000000000000000000006",
                    "sourceSigner": "0x0000000000000000000000000000000000000007",
                    "destinationCaller": "0x0000000000000000000000000000000000000000",
                    "value": "250000",
                    "salt": "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "hookData": "0x"
                }
            },
            {
                "id": "req-2",
                "domain": 1,
                "serverSide": true
            }
        ]
    });

    let operation: Operation = serde_json::from_value(json).unwrap();
    assert_eq!(operation.estimated_time_secs, Some(90));
    assert_eq!(operation.sign_requests.len(), 2);

    let burn_request = &operation.sign_requests[0];
    assert!(!burn_request.server_side);
    assert!(burn_request.calls.is_empty());
    assert_eq!(
        burn_request.burn_intent.as_ref().unwrap().value,
        "250000"
    );

    let server_request = &operation.sign_requests[1];
    assert!(server_request.server_side);
    assert!(server_request.burn_intent.is_none());
}

/// What is tested: API error response parsing
/// Why: Ensure we correctly handle error responses from the control plane
#[test]
fn test_api_error_response_parsing() {
    let json = r#"{
        "success": false,
        "data": null,
        "error": "Operation not found"
    }"#;

    let response: ApiResponse<Operation> = serde_json::from_str(json).unwrap();
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.error, Some("Operation not found".to_string()));
}

// ============================================================================
// HTTP MOCKING TESTS
// ============================================================================

fn operation_body(status: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "id": DUMMY_OPERATION_ID,
            "kind": "send",
            "status": status,
            "signRequests": [],
            "estimatedTimeSecs": 45
        },
        "error": null
    })
}

/// What is tested: create_operation() posts the request and parses the
/// prepared operation
/// Why: Ensure the request wire shape and envelope handling are correct
#[tokio::test]
async fn test_create_operation_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/operations"))
        .and(body_json(json!({
            "kind": "send",
            "destinationDomain": 6,
            "token": "0x0000000000000000000000000000000000000004",
            "recipient": "0x0000000000000000000000000000000000000006",
            "value": "250000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("AWAITING_SIGNATURE")))
        .mount(&mock_server)
        .await;

    let operation = client(&mock_server)
        .create_operation(&create_default_operation_request())
        .await
        .unwrap();

    assert_eq!(operation.id, DUMMY_OPERATION_ID);
    assert_eq!(operation.status, OperationStatus::AwaitingSignature);
    assert_eq!(operation.estimated_time_secs, Some(45));
}

/// What is tested: create_operation() surfaces the control-plane error
/// Why: Rejections must carry the service message verbatim
#[tokio::test]
async fn test_create_operation_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/operations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "data": null,
            "error": "Unsupported destination domain"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .create_operation(&create_default_operation_request())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Unsupported destination domain"));
}

/// What is tested: submit_signatures() posts the entry list and returns the
/// updated operation
/// Why: Ensure the signature wire shape matches the API
#[tokio::test]
async fn test_submit_signatures_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/operations/{}/signatures", DUMMY_OPERATION_ID)))
        .and(body_json(json!([
            {"requestId": "req-1", "executionHash": DUMMY_EXECUTION_HASH}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("PROCESSING")))
        .mount(&mock_server)
        .await;

    let entries = vec![SignatureEntry {
        request_id: "req-1".to_string(),
        execution_hash: DUMMY_EXECUTION_HASH.to_string(),
    }];
    let operation = client(&mock_server)
        .submit_signatures(DUMMY_OPERATION_ID, &entries)
        .await
        .unwrap();

    assert_eq!(operation.status, OperationStatus::Processing);
}

/// What is tested: get_operation() fetches the current state
/// Why: This is the tracker's polling read
#[tokio::test]
async fn test_get_operation_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/operations/{}", DUMMY_OPERATION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_body("COMPLETED")))
        .mount(&mock_server)
        .await;

    let operation = client(&mock_server)
        .get_operation(DUMMY_OPERATION_ID)
        .await
        .unwrap();

    assert_eq!(operation.status, OperationStatus::Completed);
    assert!(operation.status.is_terminal());
}

/// What is tested: a successful envelope with missing data is an error
/// Why: The engine must not fabricate an operation from a null payload
#[tokio::test]
async fn test_get_operation_missing_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/operations/{}", DUMMY_OPERATION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": null,
            "error": null
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .get_operation(DUMMY_OPERATION_ID)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Missing data"));
}
