/// Collapses whitespace runs to a single space, trims, and lowercases.
/// Whitespace is the Unicode space separators plus ASCII controls, U+2028,
/// U+2029 and U+FEFF. U+0085 is not whitespace.
pub fn normalize(s: &str) -> String {
    s.split(is_whitespace)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

pub fn is_correct(candidate: &str, expected: &str) -> bool {
    normalize(candidate) == normalize(expected)
}
