use sonar_api::{SseFrame, SseStreamParser};

#[test]
fn sse_framing_yields_data_then_done() {
    let payload = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"hel\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n"
    );

    let frames = SseStreamParser::parse_frames(payload);
    assert_eq!(frames.len(), 3);
    assert!(matches!(frames[0], SseFrame::Data(_)));
    assert_eq!(frames[1], SseFrame::Done);
    // The parser itself keeps draining; stopping at the sentinel is the
    // consumer's contract.
    assert!(matches!(frames[2], SseFrame::Data(_)));
}

#[test]
fn sse_parser_handles_split_frames_incrementally() {
    let mut parser = SseStreamParser::default();
    assert!(parser
        .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"abc\"")
        .is_empty());
    let mut frames = parser.feed(b"}}]}\n\n");
    assert_eq!(frames.len(), 1);
    assert!(matches!(frames.pop(), Some(SseFrame::Data(_))));
}

#[test]
fn sse_parser_skips_empty_data_frames() {
    let payload = concat!("data: \n\n", "data: {\"choices\":[]}\n\n");
    let frames = SseStreamParser::parse_frames(payload);
    assert_eq!(frames.len(), 1);
}

#[test]
fn sse_parser_joins_multiple_data_lines_in_one_frame() {
    let payload = "data: {\"citations\":\ndata: []}\n\n";
    let frames = SseStreamParser::parse_frames(payload);
    assert_eq!(
        frames,
        vec![SseFrame::Data("{\"citations\":\n[]}".to_string())]
    );
}

#[test]
fn sse_parser_ignores_incomplete_trailing_bytes() {
    let mut parser = SseStreamParser::default();
    assert!(parser.feed(b"data: {\"model\":\"sonar\"}").is_empty());
    assert!(!parser.is_empty_buffer());
}
