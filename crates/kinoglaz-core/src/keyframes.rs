//! Recovery of the embedded key-frame JSON block from model prose.
//!
//! The model is asked to append a fenced JSON object to its answer, but
//! compliance varies: the fence may be tagged, untagged, or missing
//! entirely. Extraction tries the cleanest shape first and degrades to a
//! raw brace scan before giving up. A missing block is not an error.

use crate::{
    timecode,
    types::{KeyFrame, KeyFramePayload},
};

/// Pull the key-frame payload out of a raw model response, if present.
pub fn extract_key_frames(raw_text: &str) -> Option<KeyFramePayload> {
    fenced_payload(raw_text, true)
        .or_else(|| fenced_payload(raw_text, false))
        .or_else(|| first_span_with_key_frames(raw_text).and_then(decode_payload))
}

/// Shift every frame's timecode by the owning chunk's start offset.
pub fn rebase_key_frames(frames: Vec<KeyFrame>, chunk_start_offset_seconds: u64) -> Vec<KeyFrame> {
    frames
        .into_iter()
        .map(|frame| KeyFrame {
            timecode: timecode::rebase(&frame.timecode, chunk_start_offset_seconds),
            ..frame
        })
        .collect()
}

/// Merge per-chunk frame lists, preserving chunk order and the order the
/// model emitted frames within each chunk. No deduplication, no sorting.
pub fn combine_key_frames(per_chunk: Vec<Vec<KeyFrame>>) -> Vec<KeyFrame> {
    per_chunk.into_iter().flatten().collect()
}

/// Decode one candidate JSON string. The top level must be an object with
/// a `key_frames` list; anything else is rejected.
fn decode_payload(candidate: &str) -> Option<KeyFramePayload> {
    let value: serde_json::Value = serde_json::from_str(candidate.trim()).ok()?;
    if !value.get("key_frames")?.is_array() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// First fenced block matching the wanted tag, decoded once.
fn fenced_payload(text: &str, json_tagged: bool) -> Option<KeyFramePayload> {
    let (_, body) = fenced_blocks(text).into_iter().find(|(tag, _)| match tag {
        Some(t) => json_tagged && t.eq_ignore_ascii_case("json"),
        None => !json_tagged,
    })?;
    decode_payload(body)
}

/// All fenced blocks in the text as (language tag, body) pairs. An
/// unterminated final fence still yields its block.
fn fenced_blocks(text: &str) -> Vec<(Option<&str>, &str)> {
    text.split("```")
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, block)| split_fence(block))
        .collect()
}

/// Separate the fence's language tag from the block body.
fn split_fence(block: &str) -> (Option<&str>, &str) {
    match block.split_once('\n') {
        Some((head, body)) => {
            let tag = head.trim();
            if tag.is_empty() {
                (None, body)
            } else if tag.starts_with('{') || tag.starts_with('[') {
                // payload starts on the fence line itself
                (None, block)
            } else {
                (Some(tag), body)
            }
        }
        None => (None, block),
    }
}

/// First balanced `{...}` span that mentions `key_frames`. Brace nesting
/// inside JSON strings is accounted for.
fn first_span_with_key_frames(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('{') {
        let open = search_from + rel;
        if let Some(close) = matching_close(text, open) {
            let span = &text[open..=close];
            if span.contains("key_frames") {
                return Some(span);
            }
        }
        search_from = open + 1;
    }
    None
}

fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in text.as_bytes().iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
