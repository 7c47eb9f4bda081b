use regex::{Captures, Regex};

/// Turns one regex match into zero or more items.
pub type Extractor<T> = fn(&Captures<'_>) -> Vec<T>;

/// A list of patterns, each paired with the extractor for its matches.
///
/// `scan` runs every pattern over the whole input in order and concatenates
/// the extracted items, so results follow pattern order first and match
/// position second.
pub struct PatternSet<T> {
    rules: Vec<(Regex, Extractor<T>)>,
}

impl<T> Default for PatternSet<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> PatternSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pattern. Fails only if `pattern` is not a valid regex.
    pub fn rule(mut self, pattern: &str, extract: Extractor<T>) -> Result<Self, regex::Error> {
        self.rules.push((Regex::new(pattern)?, extract));
        Ok(self)
    }

    pub fn scan(&self, content: &str) -> Vec<T> {
        let mut out = Vec::new();
        for (regex, extract) in &self.rules {
            for caps in regex.captures_iter(content) {
                out.extend(extract(&caps));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Owned copy of a match: the whole text plus each capture group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchGroups {
    pub text: String,
    groups: Vec<Option<String>>,
}

impl MatchGroups {
    pub fn from_captures(caps: &Captures<'_>) -> Vec<MatchGroups> {
        let text = caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let groups = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        vec![MatchGroups { text, groups }]
    }

    /// Capture group `index` (1-based), `None` when absent or empty.
    pub fn group(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// First non-empty group among `indices`, in the order given.
    pub fn first_of(&self, indices: &[usize]) -> Option<&str> {
        indices.iter().find_map(|&i| self.group(i))
    }
}

impl PatternSet<MatchGroups> {
    /// A set whose extractor keeps the raw groups of every match.
    pub fn from_patterns(patterns: &[&str]) -> Result<Self, regex::Error> {
        patterns
            .iter()
            .try_fold(PatternSet::new(), |set, p| set.rule(p, MatchGroups::from_captures))
    }
}

/// Non-empty capture group `index`, trimmed.
pub fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Split a `{ a, b as c }` style list into local binding names.
///
/// `a as b` resolves to `b`; empty entries and `type` prefixes are dropped.
pub fn binding_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let item = item.strip_prefix("type ").unwrap_or(item).trim();
            let local = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item,
            };
            let local = local.trim_matches(|c: char| c == '(' || c == ')').trim();
            (!local.is_empty()).then(|| local.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(caps: &Captures<'_>) -> Vec<String> {
        group(caps, 1).map(str::to_string).into_iter().collect()
    }

    #[test]
    fn test_scan_follows_pattern_then_position_order() {
        let set = PatternSet::new()
            .rule(r"class\s+(\w+)", words)
            .unwrap()
            .rule(r"function\s+(\w+)", words)
            .unwrap();
        let found = set.scan("function a() {}\nclass B {}\nclass C {}");
        assert_eq!(found, vec!["B", "C", "a"]);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(PatternSet::<String>::new().rule(r"(unclosed", words).is_err());
    }

    #[test]
    fn test_match_groups_skip_empty() {
        let set = PatternSet::from_patterns(&[r"fetch\('([^']*)'\)(x)?"]).unwrap();
        let found = set.scan("fetch('')");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].group(1), None);
        assert_eq!(found[0].group(2), None);
        assert_eq!(found[0].text, "fetch('')");
    }

    #[test]
    fn test_first_of_uses_given_order() {
        let set = PatternSet::from_patterns(&[r"(a)?(b)(c)"]).unwrap();
        let found = set.scan("bc");
        assert_eq!(found[0].first_of(&[1, 3, 2]), Some("c"));
        assert_eq!(found[0].group(0), None);
    }

    #[test]
    fn test_binding_names_resolve_aliases() {
        assert_eq!(
            binding_names(" a, b as c , type D,, "),
            vec!["a".to_string(), "c".to_string(), "D".to_string()]
        );
    }
}
