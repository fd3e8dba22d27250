//! Boundary-preserving text chunking for size-limited transports.
//!
//! Splits a report into chunks of at most `max_length` characters,
//! breaking on paragraph boundaries first, then sentence boundaries,
//! then whitespace. Chunk order follows document order.

/// Splits `text` into chunks of at most `max_length` characters.
///
/// Units are packed greedily: a chunk is closed only when appending the
/// next unit would push it over the limit. Produced chunks are trimmed of
/// trailing whitespace. An empty input yields no chunks.
#[must_use]
pub fn split_into_chunks(text: &str, max_length: usize) -> Vec<String> {
    if max_length == 0 {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for paragraph in text.split('\n') {
        if paragraph.chars().count() > max_length {
            for sentence in split_sentences(paragraph) {
                if sentence.chars().count() > max_length {
                    for word in sentence.split(' ') {
                        append_unit(&mut chunks, &mut current, &mut current_chars, word, ' ', max_length);
                    }
                } else {
                    append_unit(&mut chunks, &mut current, &mut current_chars, sentence, ' ', max_length);
                }
            }
        } else {
            append_unit(&mut chunks, &mut current, &mut current_chars, paragraph, '\n', max_length);
        }
    }

    flush(&mut chunks, &mut current, &mut current_chars);
    chunks
}

/// Appends one unit (paragraph, sentence, or word) plus its separator to
/// the running buffer, closing the current chunk first when the unit
/// would not fit.
fn append_unit(
    chunks: &mut Vec<String>,
    current: &mut String,
    current_chars: &mut usize,
    unit: &str,
    separator: char,
    max_length: usize,
) {
    let unit_chars = unit.chars().count();

    if *current_chars + unit_chars + 1 > max_length {
        flush(chunks, current, current_chars);
    }

    if unit_chars + 1 > max_length {
        // A single unbreakable unit longer than the limit: emit it in
        // fixed-size windows so no chunk ever exceeds max_length.
        let chars: Vec<char> = unit.chars().collect();
        let mut idx = 0;
        while chars.len() - idx + 1 > max_length {
            chunks.push(chars[idx..idx + max_length].iter().collect());
            idx += max_length;
        }
        current.extend(chars[idx..].iter());
        current.push(separator);
        *current_chars = chars.len() - idx + 1;
        return;
    }

    current.push_str(unit);
    current.push(separator);
    *current_chars += unit_chars + 1;
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_chars: &mut usize) {
    let trimmed = current.trim_end();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
    *current_chars = 0;
}

/// Splits a paragraph into sentences on end punctuation (`.`, `!`, `?`)
/// followed by whitespace. The whitespace run is consumed.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut iter = paragraph.char_indices().peekable();

    while let Some((i, ch)) = iter.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let followed_by_space = matches!(iter.peek(), Some((_, next)) if next.is_whitespace());
        if !followed_by_space {
            continue;
        }

        sentences.push(&paragraph[start..i + ch.len_utf8()]);
        start = i + ch.len_utf8();
        while let Some((_, next)) = iter.peek() {
            if !next.is_whitespace() {
                break;
            }
            let (j, consumed) = iter.next().unwrap_or((start, ' '));
            start = j + consumed.len_utf8();
        }
    }

    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }
    sentences
}
