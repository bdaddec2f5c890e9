//! Locale-aware string ordering for object paths and album titles.
//!
//! Strings compare level by level, like a collator with default strength:
//! base letters first (case and accents ignored, punctuation before digits
//! before letters), then accents, then case with lowercase first. Raw code
//! points break any remaining tie so the order is total.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> Vec<(u8, char)> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| (char_class(c), fold_case(c)))
        .collect()
}

fn secondary_key(s: &str) -> Vec<char> {
    s.nfd().map(fold_case).collect()
}

fn tertiary_key(s: &str) -> Vec<bool> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
        .collect()
}

fn char_class(c: char) -> u8 {
    if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    }
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut items: Vec<&str>) -> Vec<&str> {
        items.sort_by(|a, b| locale_cmp(a, b));
        items
    }

    #[test]
    fn ignores_case_at_first_level() {
        assert_eq!(sorted(vec!["banana", "Abacate"]), vec!["Abacate", "banana"]);
    }

    #[test]
    fn accented_letters_sort_with_their_base() {
        assert_eq!(
            sorted(vec!["Verão", "Viagem", "Vela"]),
            vec!["Vela", "Verão", "Viagem"]
        );
    }

    #[test]
    fn unaccented_before_accented_then_lowercase_first() {
        assert_eq!(sorted(vec!["é", "e", "E"]), vec!["e", "E", "é"]);
    }

    #[test]
    fn punctuation_before_digits_before_letters() {
        assert_eq!(sorted(vec!["a", "1", "_"]), vec!["_", "1", "a"]);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(locale_cmp("home/a", "home/a.jpg"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }
}
