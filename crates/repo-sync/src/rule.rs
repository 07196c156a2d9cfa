/// Regex compilation flags for a substitution rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFlags {
    pub case_insensitive: bool,
    /// `^` and `$` match at line boundaries.
    pub multiline: bool,
    /// `.` also matches `\n`.
    pub dot_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown regex flag '{0}' (expected one of: i, m, s)")]
pub struct InvalidFlag(pub char);

impl RuleFlags {
    /// Parse a flag string such as `"im"`. Whitespace and commas are ignored.
    pub fn parse(letters: &str) -> Result<Self, InvalidFlag> {
        let mut flags = Self::default();
        for c in letters.chars() {
            match c {
                'i' | 'I' => flags.case_insensitive = true,
                'm' | 'M' => flags.multiline = true,
                's' | 'S' => flags.dot_all = true,
                ',' => {}
                c if c.is_whitespace() => {}
                other => return Err(InvalidFlag(other)),
            }
        }
        Ok(flags)
    }
}

/// A single replacement applied to fetched text content.
///
/// Rules run in the order they were declared; each one sees the output of
/// the rules before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRule {
    pub pattern: String,
    pub replacement: String,
    pub is_regex: bool,
    pub flags: RuleFlags,
}

impl SubstitutionRule {
    pub fn literal(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            is_regex: false,
            flags: RuleFlags::default(),
        }
    }

    /// `replacement` may refer to capture groups as `$1`, `$2`, ...
    pub fn regex(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            is_regex: true,
            flags: RuleFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: RuleFlags) -> Self {
        self.flags = flags;
        self
    }
}
