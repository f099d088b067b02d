use super::*;

#[test]
fn test_parse_upload_response() {
    let json_response = r#"{
        "file_id": "a1b2c3",
        "download_url": "https://zerofs.link/d/a1b2c3",
        "upload_type": "single"
    }"#;

    let resp: UploadResponse =
        serde_json::from_str(json_response).expect("Failed to parse JSON");

    assert_eq!(resp.file_id.as_deref(), Some("a1b2c3"));
    assert_eq!(
        resp.download_url.as_deref(),
        Some("https://zerofs.link/d/a1b2c3")
    );
    assert_eq!(resp.url, None);
    assert!(resp.has_reference());
}

#[test]
fn test_parse_numeric_file_id() {
    let resp: UploadResponse =
        serde_json::from_str(r#"{"file_id": 42}"#).unwrap();
    assert_eq!(resp.file_id.as_deref(), Some("42"));
}

#[test]
fn test_parse_response_without_reference() {
    let resp: UploadResponse =
        serde_json::from_str(r#"{"status": "ok", "file_id": null}"#).unwrap();
    assert!(!resp.has_reference());
}

#[test]
fn test_error_message_from_json() {
    assert_eq!(error_message(r#"{"error": "invalid token"}"#), "invalid token");
    assert_eq!(
        error_message(r#"{"detail": "Bucket not found."}"#),
        "Bucket not found."
    );
    assert_eq!(error_message(r#"{"message": "quota exceeded"}"#), "quota exceeded");
}

#[test]
fn test_error_message_falls_back_to_text() {
    assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    assert_eq!(error_message(r#"{"code": 7}"#), r#"{"code": 7}"#);
    assert_eq!(error_message(""), "");
}
