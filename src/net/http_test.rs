use super::*;
use crate::net::types::ActionReply;

// =============================================================================
// join_url
// =============================================================================

#[test]
fn join_url_handles_leading_slash() {
    assert_eq!(join_url("http://h/api", "/auth/user/"), "http://h/api/auth/user/");
}

#[test]
fn join_url_inserts_missing_slash() {
    assert_eq!(join_url("http://h/api/", "v1/models/"), "http://h/api/v1/models/");
}

#[test]
fn join_url_empty_path_is_base() {
    assert_eq!(join_url("http://h/api/", ""), "http://h/api");
}

// =============================================================================
// check_status
// =============================================================================

#[test]
fn check_status_success_passes() {
    assert!(check_status(StatusCode::OK, "").is_ok());
    assert!(check_status(StatusCode::NO_CONTENT, "").is_ok());
}

#[test]
fn check_status_401_is_unauthorized() {
    let err = check_status(StatusCode::UNAUTHORIZED, r#"{"detail":"nope"}"#).unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert!(err.is_unauthorized());
    assert_eq!(err.status(), Some(401));
}

#[test]
fn check_status_uses_backend_error_field() {
    let err = check_status(StatusCode::BAD_REQUEST, r#"{"error":"name required"}"#).unwrap_err();
    assert_eq!(err, ApiError::Status { status: 400, message: "name required".into() });
}

#[test]
fn check_status_falls_back_to_reason_phrase() {
    let err = check_status(StatusCode::FORBIDDEN, "<html>").unwrap_err();
    assert_eq!(err, ApiError::Status { status: 403, message: "Forbidden".into() });
}

// =============================================================================
// error_message
// =============================================================================

#[test]
fn error_message_prefers_error_then_message_then_detail() {
    assert_eq!(error_message(r#"{"message":"m","detail":"d"}"#).as_deref(), Some("m"));
    assert_eq!(error_message(r#"{"detail":"d"}"#).as_deref(), Some("d"));
    assert_eq!(error_message(r#"{"error":"e","message":"m"}"#).as_deref(), Some("e"));
}

#[test]
fn error_message_ignores_non_string_fields() {
    assert_eq!(error_message(r#"{"error":{"code":1}}"#), None);
    assert_eq!(error_message("not json"), None);
}

// =============================================================================
// decode_body
// =============================================================================

#[test]
fn decode_body_empty_is_empty_object() {
    let reply: ActionReply = decode_body("  ").unwrap();
    assert_eq!(reply, ActionReply::default());
}

#[test]
fn decode_body_bad_shape_is_decode_error() {
    let err = decode_body::<Vec<i64>>(r#"{"a":1}"#).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

// =============================================================================
// cookies
// =============================================================================

#[test]
fn split_cookie_header_skips_empty_and_bare_tokens() {
    let pairs: Vec<&str> = split_cookie_header("sessionid=abc; ; csrftoken=xyz;junk").collect();
    assert_eq!(pairs, vec!["sessionid=abc", "csrftoken=xyz"]);
}

#[test]
fn restored_cookies_round_trip_through_jar() {
    let client = HttpClient::new("http://127.0.0.1:9/api", HttpTimeouts::default()).unwrap();
    assert_eq!(client.cookie_header(), None);

    client.restore_cookies("sessionid=abc");
    assert_eq!(client.cookie_header().as_deref(), Some("sessionid=abc"));
}

#[test]
fn new_rejects_relative_base_url() {
    let result = HttpClient::new("/api", HttpTimeouts::default());
    assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
}

#[test]
fn endpoint_joins_onto_api_url() {
    let client = HttpClient::new("http://127.0.0.1:9/api/", HttpTimeouts::default()).unwrap();
    assert_eq!(client.api_url(), "http://127.0.0.1:9/api");
    assert_eq!(client.endpoint("/v1/models/"), "http://127.0.0.1:9/api/v1/models/");
}
