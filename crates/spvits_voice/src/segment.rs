//! Sentence-boundary text splitting for synthesis requests.

/// Sentence-ending punctuation (including Chinese full-width forms)
pub const SENTENCE_ENDERS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

/// Split text into segments of at most `max_length` characters.
///
/// Text is cut into sentences after each terminal mark (the mark stays with
/// its sentence), then sentences are packed greedily. A single sentence
/// longer than `max_length` is emitted whole as its own segment.
///
/// Lengths are counted in chars, not bytes (Chinese chars are 3 bytes).
/// Concatenating the result always gives back `text`.
pub fn split_text(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);

    if text.chars().count() <= max_length {
        return vec![text.to_string()];
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for (sentence, sentence_chars) in sentences(text) {
        if current_chars + sentence_chars <= max_length {
            current.push_str(sentence);
            current_chars += sentence_chars;
        } else {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
            current_chars = sentence_chars;
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Yields each sentence slice with its char count.
fn sentences(text: &str) -> impl Iterator<Item = (&str, usize)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut chars = 0;
        let mut end = rest.len();
        for (idx, ch) in rest.char_indices() {
            chars += 1;
            if SENTENCE_ENDERS.contains(&ch) {
                end = idx + ch.len_utf8();
                break;
            }
        }
        let (sentence, tail) = rest.split_at(end);
        rest = tail;
        Some((sentence, chars))
    })
}
