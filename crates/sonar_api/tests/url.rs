use sonar_api::{normalize_chat_url, url::DEFAULT_API_BASE_URL};

#[test]
fn empty_input_falls_back_to_the_default_base() {
    assert_eq!(
        normalize_chat_url(""),
        format!("{DEFAULT_API_BASE_URL}/chat/completions")
    );
    assert_eq!(
        normalize_chat_url("   "),
        format!("{DEFAULT_API_BASE_URL}/chat/completions")
    );
}

#[test]
fn complete_endpoint_is_kept_unchanged() {
    assert_eq!(
        normalize_chat_url("https://example.test/chat/completions"),
        "https://example.test/chat/completions"
    );
}

#[test]
fn chat_suffix_gains_completions() {
    assert_eq!(
        normalize_chat_url("https://example.test/chat/"),
        "https://example.test/chat/completions"
    );
}

#[test]
fn bare_base_gains_the_full_path() {
    assert_eq!(
        normalize_chat_url("https://example.test"),
        "https://example.test/chat/completions"
    );
}
