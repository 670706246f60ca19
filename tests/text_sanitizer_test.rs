use ragchat::infrastructure::text_processing::sanitize_extracted_text;

#[test]
fn given_hyphenated_line_break_when_sanitized_then_word_rejoined() {
    let text = sanitize_extracted_text("the trans-\nformer architecture");

    assert_eq!(text, "the transformer architecture");
}

#[test]
fn given_hyphen_break_with_crlf_and_indent_when_sanitized_then_word_rejoined() {
    let text = sanitize_extracted_text("atten-  \r\n   tion heads");

    assert_eq!(text, "attention heads");
}

#[test]
fn given_blank_line_runs_when_sanitized_then_single_paragraph_break() {
    let text = sanitize_extracted_text("first paragraph\n\n\n   \n\nsecond paragraph\n\n");

    assert_eq!(text, "first paragraph\n\nsecond paragraph");
}

#[test]
fn given_wrapped_lines_when_sanitized_then_line_breaks_kept_within_paragraph() {
    let text = sanitize_extracted_text("  line one  \nline   two\t\tend ");

    assert_eq!(text, "line one\nline two end");
}

#[test]
fn given_ligatures_and_nbsp_when_sanitized_then_normalized() {
    let text = sanitize_extracted_text("e\u{fb03}cient\u{a0}\u{a0}search");

    assert_eq!(text, "efficient search");
}

#[test]
fn given_whitespace_only_when_sanitized_then_empty() {
    assert_eq!(sanitize_extracted_text(" \n\t\n "), "");
}
