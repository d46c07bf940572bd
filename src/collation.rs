//! Alphabetical ordering under Turkish rules.
//!
//! Turkish orders `ç ğ ı ö ş ü` right after their base letters and
//! distinguishes dotted and dotless i (`I` lowercases to `ı`, `İ` to `i`).
//! Other Latin accents (`é`, `ä`, `ñ`) weigh as their base letter.

use std::cmp::Ordering;

const ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

fn fold(c: char) -> char {
    match c {
        'I' => 'ı',
        'İ' => 'i',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

/// Accented letters outside the Turkish alphabet map to their base letter.
fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' | 'ō' | 'ő' => 'o',
        'ù' | 'ú' | 'û' | 'ū' | 'ů' | 'ű' => 'u',
        'ć' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ř' => 'r',
        'ś' | 'š' => 's',
        'ť' => 't',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Primary weight: separators, then digits, then the alphabet, then the rest.
fn weight(c: char) -> (u8, u32) {
    let c = strip_diacritic(fold(c));
    if c.is_whitespace() || c.is_ascii_punctuation() {
        return (0, c as u32);
    }
    if c.is_ascii_digit() {
        return (1, c as u32);
    }
    match ALPHABET.chars().position(|a| a == c) {
        Some(i) => (2, i as u32),
        None => (3, c as u32),
    }
}

pub fn compare(a: &str, b: &str) -> Ordering {
    let primary = a.chars().map(weight).cmp(b.chars().map(weight));
    // Case-only differences fall back to code points for a total order.
    primary.then_with(|| a.cmp(b))
}

pub fn sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|x, y| compare(key(x), key(y)));
}
