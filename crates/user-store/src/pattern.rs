//! Glob patterns as understood by Redis `KEYS` and `SCAN MATCH`.
//!
//! | Token | Matches |
//! |-------|---------|
//! | `*` | any run of characters, including none |
//! | `?` | exactly one character |
//! | `[abc]`, `[a-z]` | one character from the set or range |
//! | `[^a]` | one character not in the set |
//! | `\x` | the literal `x` |
//!
//! An unterminated `[` is matched literally.

/// Returns `true` if `text` matches the glob `pattern` in full.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // Position of the last `*` seen and the text index it is currently
    // assumed to stretch up to.
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() {
            if p[pi] == '*' {
                star = Some((pi, ti));
                pi += 1;
                continue;
            }
            if let Some(width) = match_one(&p[pi..], t[ti]) {
                pi += width;
                ti += 1;
                continue;
            }
        }
        match star {
            Some((sp, st)) => {
                pi = sp + 1;
                ti = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// The literal text every match of `pattern` starts with.
///
/// Ordered backends use this to turn a scan into a range query.
pub fn literal_prefix(pattern: &str) -> String {
    let mut prefix = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' | '?' | '[' => break,
            '\\' => match chars.next() {
                Some(escaped) => prefix.push(escaped),
                None => break,
            },
            other => prefix.push(other),
        }
    }
    prefix
}

/// Escape `literal` so that it only matches itself inside a pattern.
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Match a single non-`*` token at the start of `p` against `c`.
/// Returns the token width on success.
fn match_one(p: &[char], c: char) -> Option<usize> {
    match p[0] {
        '?' => Some(1),
        '[' => match match_class(p, c) {
            Some((true, width)) => Some(width),
            Some((false, _)) => None,
            None => (c == '[').then_some(1),
        },
        '\\' if p.len() > 1 => (p[1] == c).then_some(2),
        literal => (literal == c).then_some(1),
    }
}

/// Evaluate a `[...]` class at the start of `p`.
///
/// Returns whether `c` is accepted and the class width, or `None` when the
/// class is never closed.
fn match_class(p: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = p.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        match *p.get(i)? {
            ']' => break,
            '\\' => {
                if *p.get(i + 1)? == c {
                    matched = true;
                }
                i += 2;
            }
            lo if p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some_and(|&h| h != ']') => {
                let hi = p[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                if (lo..=hi).contains(&c) {
                    matched = true;
                }
                i += 3;
            }
            other => {
                if other == c {
                    matched = true;
                }
                i += 1;
            }
        }
    }

    Some((matched != negate, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_suffix() {
        assert!(glob_match("user:*", "user:a@x.com"));
        assert!(glob_match("user:*", "user:"));
        assert!(!glob_match("user:*", "users:a@x.com"));
        assert!(!glob_match("user:*", "session:a@x.com"));
    }

    #[test]
    fn star_in_the_middle_backtracks() {
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(glob_match("a*b", "abbb"));
        assert!(!glob_match("a*b", "abbc"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("?", ""));
    }

    #[test]
    fn question_mark_is_one_char() {
        assert!(glob_match("h?llo", "hello"));
        assert!(glob_match("h?llo", "hällo"));
        assert!(!glob_match("h?llo", "hllo"));
    }

    #[test]
    fn classes_and_ranges() {
        assert!(glob_match("h[ae]llo", "hello"));
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("h[^e]llo", "hallo"));
        assert!(!glob_match("h[^e]llo", "hello"));
        assert!(glob_match("h[a-b]llo", "hbllo"));
        assert!(glob_match("h[b-a]llo", "hallo"));
        assert!(!glob_match("h[]llo", "hllo"));
    }

    #[test]
    fn escapes_are_literal() {
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
        assert!(glob_match(r"[\]]", "]"));
    }

    #[test]
    fn unterminated_class_is_literal() {
        assert!(glob_match("a[b", "a[b"));
        assert!(!glob_match("a[b", "ab"));
    }

    #[test]
    fn literal_prefix_stops_at_first_metachar() {
        assert_eq!(literal_prefix("user:*"), "user:");
        assert_eq!(literal_prefix(r"us\*er:?"), "us*er:");
        assert_eq!(literal_prefix("[ab]c"), "");
        assert_eq!(literal_prefix("plain"), "plain");
    }

    #[test]
    fn escaped_text_matches_only_itself() {
        let tricky = r"we[ir]d*key?\";
        let pattern = escape(tricky);
        assert!(glob_match(&pattern, tricky));
        assert!(!glob_match(&pattern, "weird-key"));
        assert_eq!(literal_prefix(&format!("{pattern}*")), tricky);
    }
}
