use regex::{Regex, RegexBuilder};

use crate::rule::SubstitutionRule;

/// Apply `rules` in order to `content`.
///
/// Content that is not valid UTF-8 is treated as binary and returned
/// untouched regardless of the configured rules.
pub fn substitute(content: &[u8], rules: &[SubstitutionRule]) -> Vec<u8> {
    if rules.is_empty() {
        return content.to_vec();
    }

    match std::str::from_utf8(content) {
        Ok(text) => substitute_text(text, rules).into_bytes(),
        Err(_) => {
            tracing::debug!("content is not valid UTF-8, skipping substitution");
            content.to_vec()
        }
    }
}

/// Apply `rules` in order to decoded text.
///
/// A regex rule whose pattern fails to compile is logged and skipped; the
/// remaining rules still apply.
pub fn substitute_text(text: &str, rules: &[SubstitutionRule]) -> String {
    let mut current = text.to_owned();
    let mut applied = 0usize;

    for rule in rules {
        let next = if rule.is_regex {
            match compile(rule) {
                Ok(regex) => {
                    let replacement = rewrite_group_references(&rule.replacement);
                    regex.replace_all(&current, replacement.as_str()).into_owned()
                }
                Err(e) => {
                    tracing::warn!(pattern = %rule.pattern, error = %e, "skipping invalid regex rule");
                    continue;
                }
            }
        } else {
            current.replace(&rule.pattern, &rule.replacement)
        };

        if next != current {
            applied += 1;
            tracing::debug!(pattern = %rule.pattern, replacement = %rule.replacement, "replaced");
            current = next;
        }
    }

    if applied > 0 {
        tracing::info!("made {applied} substitution(s)");
    }

    current
}

fn compile(rule: &SubstitutionRule) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&rule.pattern)
        .case_insensitive(rule.flags.case_insensitive)
        .multi_line(rule.flags.multiline)
        .dot_matches_new_line(rule.flags.dot_all)
        .build()
}

/// Translate `$1`-style group references into the braced `${1}` form the
/// `regex` crate expects.
///
/// Unbraced `$1a` would otherwise be read as a group named `1a`. Any `$` that
/// does not introduce a numeric reference is kept as a literal dollar sign.
pub fn rewrite_group_references(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }

        if digits.is_empty() {
            out.push_str("$$");
        } else {
            out.push_str("${");
            out.push_str(&digits);
            out.push('}');
        }
    }

    out
}
