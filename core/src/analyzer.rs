use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Shortest n-gram emitted for a word.
pub const MIN_GRAM: usize = 2;
/// Longest n-gram emitted for a word.
pub const MAX_GRAM: usize = 3;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)[\p{L}\p{M}\p{N}_']+").expect("valid regex");
}

/// Tokenize text into character n-grams using NFKC normalization, lowercasing and
/// word splitting on whitespace/punctuation.
///
/// Non-alphabetic characters are stripped from each word before shingling. Each word
/// yields every contiguous gram of `MIN_GRAM..=MAX_GRAM` characters, ordered by start
/// position and then by length (`"abcd"` gives `ab, abc, bc, bcd, cd`). Duplicates are
/// kept so callers can count term frequency.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in WORD_RE.find_iter(&normalized) {
        let word: Vec<char> = mat.as_str().chars().filter(|c| c.is_alphabetic()).collect();
        shingle(&word, &mut tokens);
    }
    tokens
}

fn shingle(word: &[char], out: &mut Vec<String>) {
    for start in 0..word.len() {
        for len in MIN_GRAM..=MAX_GRAM {
            let end = start + len;
            if end > word.len() {
                break;
            }
            out.push(word[start..end].iter().collect());
        }
    }
}
