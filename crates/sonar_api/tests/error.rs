use reqwest::StatusCode;
use sonar_api::error::parse_error_message;
use sonar_api::SonarApiError;

#[test]
fn pre_stream_status_triage_covers_every_kind() {
    let cases = [
        (401, "authentication failed"),
        (402, "insufficient balance"),
        (429, "rate limited"),
        (500, "HTTP 500"),
        (503, "HTTP 503"),
    ];

    for (code, prefix) in cases {
        let status = StatusCode::from_u16(code).expect("valid status code");
        let error = SonarApiError::from_status(status, "");
        assert!(
            error.to_string().starts_with(prefix),
            "status {code} rendered as {error}"
        );
    }
}

#[test]
fn structured_error_body_message_is_surfaced() {
    let status = StatusCode::UNAUTHORIZED;
    let body = r#"{"error":{"message":"bad key"}}"#;
    let error = SonarApiError::from_status(status, body);
    assert_eq!(error.to_string(), "authentication failed: bad key");
}

#[test]
fn error_type_field_backs_up_a_missing_message() {
    let body = r#"{"error":{"type":"invalid_model"}}"#;
    assert_eq!(
        parse_error_message(StatusCode::BAD_REQUEST, body),
        "invalid_model"
    );
}

#[test]
fn non_json_body_is_used_verbatim() {
    assert_eq!(
        parse_error_message(StatusCode::BAD_GATEWAY, "<html>nope</html>"),
        "<html>nope</html>"
    );
}
