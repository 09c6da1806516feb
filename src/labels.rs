//! Display labels for camelCase artifact keys.

/// Splits a camelCase key into words and capitalizes the first and last word.
///
/// Runs of capitals are kept together as one word, so `effectiveFPSAvg`
/// becomes `Effective FPS Avg`. The first and last words are lowercased after
/// their initial, which turns a trailing acronym into `Fps`. Keys that do not
/// start with a lowercase word are returned unchanged.
pub fn humanize_label(key: &str) -> String {
    let words = split_camel_case(key);
    if words.is_empty() {
        return key.to_string();
    }

    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            if index == 0 || index == last {
                capitalize(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_camel_case(key: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = key.char_indices().collect();
    if !chars.first().is_some_and(|(_, c)| c.is_ascii_lowercase())
        || !chars.iter().all(|(_, c)| c.is_ascii_alphabetic())
    {
        return Vec::new();
    }

    let mut words = Vec::new();
    let mut start = 0;
    for window in 1..chars.len() {
        let (index, current) = chars[window];
        let previous = chars[window - 1].1;
        let next = chars.get(window + 1).map(|(_, c)| *c);
        let boundary = if current.is_ascii_uppercase() {
            // A new word starts at a capital following a lowercase letter, or
            // at the last capital of an acronym run that precedes lowercase.
            previous.is_ascii_lowercase()
                || next.is_some_and(|next| next.is_ascii_lowercase())
        } else {
            false
        };
        if boundary {
            words.push(&key[start..index]);
            start = index;
        }
    }
    words.push(&key[start..]);
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}
