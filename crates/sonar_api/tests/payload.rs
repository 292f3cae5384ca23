use serde_json::Value;
use sonar_api::{ChatMessage, ChatRequest, WebSearchOptions};

fn serialized(request: &ChatRequest) -> Value {
    serde_json::to_value(request).expect("request should serialize")
}

#[test]
fn request_serializes_core_sampling_fields() {
    let request = ChatRequest::new("sonar", vec![ChatMessage::user("hi")]);
    let value = serialized(&request);

    assert_eq!(value["model"], "sonar");
    assert_eq!(value["messages"][0]["role"], "user");
    assert_eq!(value["messages"][0]["content"], "hi");
    assert_eq!(value["stream"], true);
    assert_eq!(value["return_citations"], true);
    assert_eq!(value["return_images"], false);
}

#[test]
fn unset_search_knobs_are_omitted_from_the_wire() {
    let request = ChatRequest::new("sonar", Vec::new());
    let value = serialized(&request);

    assert!(value.get("search_domain_filter").is_none());
    assert!(value.get("search_recency_filter").is_none());
    assert!(value.get("search_mode").is_none());
    assert!(value.get("web_search_options").is_none());
}

#[test]
fn configured_search_knobs_ride_in_the_expected_shapes() {
    let mut request = ChatRequest::new("sonar", Vec::new());
    request.search_domain_filter = vec!["example.test".to_string()];
    request.search_recency_filter = Some("week".to_string());
    request.search_mode = Some("academic".to_string());
    request.web_search_options = Some(WebSearchOptions {
        search_context_size: "high".to_string(),
    });

    let value = serialized(&request);
    assert_eq!(value["search_domain_filter"][0], "example.test");
    assert_eq!(value["search_recency_filter"], "week");
    assert_eq!(value["search_mode"], "academic");
    assert_eq!(value["web_search_options"]["search_context_size"], "high");
}

#[test]
fn message_constructors_set_roles() {
    assert_eq!(
        serde_json::to_value(ChatMessage::system("s")).expect("message should serialize")["role"],
        "system"
    );
    assert_eq!(
        serde_json::to_value(ChatMessage::assistant("a")).expect("message should serialize")
            ["role"],
        "assistant"
    );
}
