use sonar_api::{assemble_response, ChatChunk, DeltaTracker, SearchResponse, SseFrame, SseStreamParser};

/// Mirrors the client's event loop over raw SSE bytes: parse frames, skip
/// malformed payloads, stop at the sentinel, assemble from the last
/// well-formed chunk.
fn consume(chunks: &[&[u8]]) -> (Vec<String>, SearchResponse) {
    let mut parser = SseStreamParser::default();
    let mut tracker = DeltaTracker::default();
    let mut increments = Vec::new();
    let mut full_content = String::new();
    let mut last_chunk = ChatChunk::default();

    'stream: for bytes in chunks {
        for frame in parser.feed(bytes) {
            let payload = match frame {
                SseFrame::Done => break 'stream,
                SseFrame::Data(payload) => payload,
            };
            let Ok(parsed) = serde_json::from_str::<ChatChunk>(&payload) else {
                continue;
            };
            if let Some(increment) = tracker.push(parsed.content()) {
                full_content.push_str(&increment);
                increments.push(increment);
            }
            last_chunk = parsed;
        }
    }

    (increments, assemble_response(&last_chunk, full_content))
}

#[test]
fn stream_assembles_deltas_and_final_metadata() {
    let (increments, response) = consume(&[
        b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}],\"usage\":{\"total_tokens\":7,\"cost\":{\"total_cost\":0.001}}}\n\n",
        b"data: [DONE]\n\n",
    ]);

    assert_eq!(increments, vec!["Hi", " there"]);
    assert_eq!(response.content, "Hi there");
    assert_eq!(response.usage.total_tokens, 7);
    assert!((response.cost.total_cost - 0.001).abs() < f64::EPSILON);
}

#[test]
fn stream_skips_malformed_payloads_and_still_completes() {
    let (increments, response) = consume(&[
        b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        b"data: this is not json\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}],\"citations\":[\"https://example.test\"]}\n\n",
        b"data: [DONE]\n\n",
    ]);

    assert_eq!(increments, vec!["ok", "!"]);
    assert_eq!(response.content, "ok!");
    assert_eq!(response.citations, vec!["https://example.test"]);
}

#[test]
fn stream_stops_at_the_sentinel_and_ignores_later_frames() {
    let (increments, response) = consume(&[
        b"data: {\"choices\":[{\"delta\":{\"content\":\"done\"}}]}\n\n",
        b"data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"ghost\"}}]}\n\n",
    ]);

    assert_eq!(increments, vec!["done"]);
    assert_eq!(response.content, "done");
}

#[test]
fn stream_survives_frames_split_across_reads() {
    let (increments, response) = consume(&[
        b"data: {\"choices\":[{\"delta\":",
        b"{\"content\":\"split\"}}]}\n\ndata: [DONE]\n\n",
    ]);

    assert_eq!(increments, vec!["split"]);
    assert_eq!(response.content, "split");
}

#[test]
fn stream_with_no_events_yields_an_empty_default_response() {
    let (increments, response) = consume(&[b"data: [DONE]\n\n"]);

    assert!(increments.is_empty());
    assert_eq!(response, SearchResponse::default());
}
