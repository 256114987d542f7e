use super::*;

#[test]
fn code_str_mapping() {
    assert_eq!(PortalError::NotFound("alice".into()).code_str(), "not_found");
    assert_eq!(PortalError::MissingField("id").code_str(), "missing_field");
    assert_eq!(PortalError::BackendError("x".into()).code_str(), "backend_error");
    assert_eq!(PortalError::UnexpectedShape("x".into()).code_str(), "unexpected_shape");
    assert_eq!(PortalError::TransportError("x".into()).code_str(), "transport_error");
    assert_eq!(PortalError::HttpError(500).code_str(), "http_error");
    assert_eq!(PortalError::decode("<html>").code_str(), "decode_error");
}

#[test]
fn display_messages() {
    assert_eq!(PortalError::MissingField("alias").to_string(), "missing field 'alias'");
    assert_eq!(PortalError::HttpError(403).to_string(), "HTTP 403");
    assert_eq!(PortalError::NotFound("bob".into()).to_string(), "bob not found");
}

#[test]
fn decode_snippet_is_truncated() {
    let body = "x".repeat(500);
    match PortalError::decode(&body) {
        PortalError::DecodeError { snippet } => {
            assert_eq!(snippet.chars().count(), SNIPPET_LEN + 1);
            assert!(snippet.ends_with('…'));
        }
        other => panic!("expected DecodeError, got {other:?}"),
    }
}

#[test]
fn decode_snippet_short_body_kept_whole() {
    match PortalError::decode("  <html>login</html>\n") {
        PortalError::DecodeError { snippet } => assert_eq!(snippet, "<html>login</html>"),
        other => panic!("expected DecodeError, got {other:?}"),
    }
}
