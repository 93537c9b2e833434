/// Splits a raw ingredient statement into individual ingredient phrases.
///
/// Commas and semicolons separate ingredients only outside parentheses, so
/// `"Salt (Sodium Chloride, Iodine)"` stays one entry. Whitespace inside each
/// phrase is collapsed and a standalone `and` splits a phrase in two.
pub fn split_ingredients(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;

    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                buf.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                buf.push(ch);
            }
            ',' | ';' if depth == 0 => {
                push_phrase(&mut phrases, &buf);
                buf.clear();
            }
            _ => buf.push(ch),
        }
    }
    push_phrase(&mut phrases, &buf);

    phrases
}

fn push_phrase(out: &mut Vec<String>, raw: &str) {
    let collapsed = collapse_whitespace(raw);
    if collapsed.is_empty() {
        return;
    }
    let words: Vec<&str> = collapsed.split(' ').collect();
    let last = words.len() - 1;
    let mut part: Vec<&str> = Vec::new();
    for (i, &word) in words.iter().enumerate() {
        // Only a conjunction between two words splits; any letter case.
        if i > 0 && i < last && word.eq_ignore_ascii_case("and") && !part.is_empty() {
            out.push(part.join(" "));
            part.clear();
        } else {
            part.push(word);
        }
    }
    if !part.is_empty() {
        out.push(part.join(" "));
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes an ingredient or record name for comparison: lowercase,
/// trimmed, surrounding punctuation stripped and inner whitespace collapsed.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    collapse_whitespace(stripped)
}

/// Splits a normalized name into its distinct words, in first-seen order.
pub fn tokenize_name(normalized: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        if !words.iter().any(|seen| seen == word) {
            words.push(word.to_string());
        }
    }
    words
}
