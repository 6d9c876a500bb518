//! Text normalization and feature extraction

/// Lowercase, collapse dotted acronyms and replace punctuation with spaces
///
/// "U.S.A. flights?" becomes "usa flights".
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let chars: Vec<char> = lowered.chars().collect();
    let mut out = String::with_capacity(lowered.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if c == '.' && is_acronym_dot(&chars, i) {
            // dropped so the letters join up
        } else if c == '\'' {
            // keep contractions together: "what's" -> "whats"
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A dot directly after a single letter that itself follows a boundary or
/// another acronym dot
fn is_acronym_dot(chars: &[char], i: usize) -> bool {
    if i == 0 || !chars[i - 1].is_alphabetic() {
        return false;
    }
    i == 1 || !chars[i - 2].is_alphanumeric()
}

/// Unigram tokens plus adjacent bigrams joined with `_`
pub fn extract_features(normalized: &str) -> Vec<String> {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let mut features: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    features.extend(tokens.windows(2).map(|pair| format!("{}_{}", pair[0], pair[1])));
    features
}
