//! Splits reply text into bounded chunks for sequential playback.
//!
//! Long utterances are unreliable on mobile synthesizers (they stall or get
//! cut off), so every reply is broken up before it reaches the device:
//!
//! ```text
//!   text ──▶ sentences (. ! ? + whitespace)
//!              │
//!              ├─ sentence > limit ──▶ split at last ',' / ' ' / hard cut
//!              └─ sentence ≤ limit ──▶ packed greedily with its neighbours
//! ```
//!
//! Lengths are counted in characters, not bytes.

/// One ordered fragment of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechChunk {
    pub text: String,
    /// 0-based position in the message.
    pub index: usize,
    pub total: usize,
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Returns an empty vector for blank text.  A `limit` of zero is treated as
/// one.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<SpeechChunk> {
    let limit = limit.max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in sentences(text) {
        let len = char_len(sentence);

        if len > limit {
            flush(&mut current, &mut pieces);
            pieces.extend(split_long(sentence, limit));
            continue;
        }

        if current.is_empty() {
            current.push_str(sentence);
        } else if char_len(&current) + 1 + len <= limit {
            current.push(' ');
            current.push_str(sentence);
        } else {
            flush(&mut current, &mut pieces);
            current.push_str(sentence);
        }
    }
    flush(&mut current, &mut pieces);

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| SpeechChunk { text, index, total })
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn flush(current: &mut String, pieces: &mut Vec<String>) {
    if !current.is_empty() {
        pieces.push(std::mem::take(current));
    }
}

/// Trimmed, non-empty sentences.  Terminal punctuation stays with its
/// sentence.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;

    for (i, c) in text.char_indices() {
        if prev_terminal && c.is_whitespace() {
            push_trimmed(&text[start..i], &mut out);
            start = i;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }
    push_trimmed(&text[start..], &mut out);
    out
}

fn push_trimmed<'a>(s: &'a str, out: &mut Vec<&'a str>) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Break a single over-long sentence.  Each piece ends at the last comma
/// (kept) or the last space (dropped) within the limit, else at the limit.
fn split_long(sentence: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = sentence.trim();

    while char_len(rest) > limit {
        // Byte offset just past the `limit`-th character.
        let window_end = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let (head, tail) = if let Some(i) = window.rfind(',') {
            rest.split_at(i + 1)
        } else if let Some(i) = window.rfind(' ').filter(|&i| i > 0) {
            (&rest[..i], &rest[i + 1..])
        } else {
            rest.split_at(window_end)
        };

        let head = head.trim();
        if !head.is_empty() {
            out.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}
