//! Glob patterns for key scans
//!
//! Supports `*`, `?`, `[...]` classes (with `^` negation and `a-z` ranges) and
//! `\` escapes, which is the subset key scans are issued with.

/// Escape glob metacharacters so `s` only matches itself.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Test `key` against the glob `pattern`.
pub fn matches(pattern: &str, key: &str) -> bool {
    match_bytes(pattern.as_bytes(), key.as_bytes())
}

fn match_bytes(p: &[u8], s: &[u8]) -> bool {
    let (mut pi, mut si) = (0usize, 0usize);
    // Position of the last `*` seen and the key offset it currently absorbs up to
    let mut backtrack: Option<(usize, usize)> = None;

    while si < s.len() {
        if let Some(step) = step(p, pi, s[si]) {
            match step {
                Step::Star => {
                    backtrack = Some((pi, si));
                    pi += 1;
                    continue;
                }
                Step::Advance(next) => {
                    pi = next;
                    si += 1;
                    continue;
                }
            }
        }

        match backtrack {
            Some((star, absorbed)) => {
                pi = star + 1;
                si = absorbed + 1;
                backtrack = Some((star, absorbed + 1));
            }
            None => return false,
        }
    }

    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}

enum Step {
    Star,
    Advance(usize),
}

/// Try to consume one key byte `c` at pattern position `pi`.
fn step(p: &[u8], pi: usize, c: u8) -> Option<Step> {
    let token = *p.get(pi)?;
    match token {
        b'*' => Some(Step::Star),
        b'?' => Some(Step::Advance(pi + 1)),
        b'\\' if pi + 1 < p.len() => (p[pi + 1] == c).then_some(Step::Advance(pi + 2)),
        b'[' => match match_class(p, pi, c) {
            Some((true, next)) => Some(Step::Advance(next)),
            Some((false, _)) => None,
            // Unterminated class: `[` is a literal
            None => (c == b'[').then_some(Step::Advance(pi + 1)),
        },
        literal => (literal == c).then_some(Step::Advance(pi + 1)),
    }
}

/// Evaluate the class starting at `p[start] == b'['`.
///
/// Returns `(matched, index after ']')`, or `None` if the class is unterminated.
fn match_class(p: &[u8], start: usize, c: u8) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = p.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < p.len() {
        if p[i] == b']' {
            return Some((matched != negate, i + 1));
        }

        let lo = if p[i] == b'\\' && i + 1 < p.len() {
            i += 1;
            p[i]
        } else {
            p[i]
        };

        if i + 2 < p.len() && p[i + 1] == b'-' && p[i + 2] != b']' {
            let hi = p[i + 2];
            let (a, b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if (a..=b).contains(&c) {
                matched = true;
            }
            i += 3;
        } else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_star() {
        assert!(matches("schema:{*.*}", "schema:{app.users}"));
        assert!(!matches("schema:{*.*}", "schema:{app}"));
        assert!(matches("{app.users}:idx:status:*", "{app.users}:idx:status:active"));
        assert!(!matches("{app.users}:idx:status:*", "{app.users}:idx:meta"));
        assert!(matches("*", ""));
        assert!(matches("a*b*c", "a__b__b__c"));
        assert!(!matches("a*b*c", "a__b__b__"));
    }

    #[test]
    fn test_question_and_class() {
        assert!(matches("row:?", "row:7"));
        assert!(!matches("row:?", "row:77"));
        assert!(matches("row:[0-9]", "row:4"));
        assert!(!matches("row:[^0-9]", "row:4"));
        assert!(matches("row:[abc]", "row:b"));
        assert!(matches("row:[", "row:["));
    }

    #[test]
    fn test_escape_round_trip() {
        let name = "weird*col?[x]";
        let pattern = format!("{}:*", escape(name));
        assert!(matches(&pattern, "weird*col?[x]:value"));
        assert!(!matches(&pattern, "weirdXcolY[x]:value"));
    }
}
