use unicase::UniCase;

use super::Candidate;

/// Knobs for the matcher chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub case_insensitive: bool,
    pub typo: bool,
    /// Edit distance tolerated by the typo tier
    pub errors: usize,
}

/// Run the matcher chain over `candidates` for the word being completed.
///
/// Tiers run in order (exact prefix, case-insensitive prefix, camel-hump,
/// typo) and the first tier with survivors wins. Returns indices into
/// `candidates`.
pub fn match_candidates(word: &str, candidates: &[Candidate], opts: MatchOptions) -> Vec<usize> {
    if word.is_empty() {
        return (0..candidates.len()).collect();
    }

    let exact: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.value.starts_with(word))
        .map(|(i, _)| i)
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    if opts.case_insensitive {
        let folded: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| prefix_eq_ignore_case(&c.value, word))
            .map(|(i, _)| i)
            .collect();
        if !folded.is_empty() {
            return folded;
        }
    }

    let humps: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| camel_match(word, &c.value))
        .map(|(i, _)| i)
        .collect();
    if !humps.is_empty() {
        return humps;
    }

    if opts.typo && word.chars().count() > opts.errors {
        let typos: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let prefix: String = c.value.chars().take(word.chars().count()).collect();
                levenshtein(word, &prefix) <= opts.errors
            })
            .map(|(i, _)| i)
            .collect();
        if !typos.is_empty() {
            return typos;
        }
    }

    Vec::new()
}

fn prefix_eq_ignore_case(value: &str, word: &str) -> bool {
    let prefix: String = value.chars().take(word.chars().count()).collect();
    prefix.chars().count() == word.chars().count() && UniCase::new(prefix) == UniCase::new(word)
}

/// `fB` or `foBa` against `fooBar`: each word segment must prefix-match the
/// corresponding hump of the candidate. All-lowercase probes like `fb` fall
/// back to one segment per character.
fn camel_match(word: &str, value: &str) -> bool {
    let humps = split_humps(value);
    if match_probes(&split_probe(word), &humps) {
        return true;
    }
    let per_char: Vec<String> = word.chars().map(|c| c.to_string()).collect();
    per_char.len() > 1 && match_probes(&per_char, &humps)
}

fn match_probes(probes: &[String], humps: &[String]) -> bool {
    if probes.len() > humps.len() || probes.is_empty() {
        return false;
    }
    probes
        .iter()
        .zip(humps.iter())
        .all(|(probe, hump)| prefix_eq_ignore_case(hump, probe))
}

/// Split on uppercase letters and `-`/`_` separators: `fooBar-baz` ->
/// `["foo", "Bar", "baz"]`.
fn split_humps(value: &str) -> Vec<String> {
    let mut humps: Vec<String> = Vec::new();
    for c in value.chars() {
        let boundary = c.is_uppercase() || c == '-' || c == '_';
        if boundary || humps.is_empty() {
            humps.push(String::new());
        }
        if c != '-' && c != '_' {
            humps.last_mut().unwrap().push(c);
        }
    }
    humps.retain(|h| !h.is_empty());
    humps
}

/// Split the probe word at its own uppercase letters: `fB` -> `["f", "B"]`.
fn split_probe(word: &str) -> Vec<String> {
    let mut probes: Vec<String> = Vec::new();
    for c in word.chars() {
        if c.is_uppercase() || probes.is_empty() {
            probes.push(String::new());
        }
        probes.last_mut().unwrap().push(c);
    }
    probes
}

/// Longest common prefix of the matched values, on char boundaries.
pub fn common_prefix<'a, I: Iterator<Item = &'a str> + Clone>(mut values: I) -> String {
    let Some(first) = values.next() else {
        return String::new();
    };
    let mut prefix = first.to_string();
    for value in values {
        let mut common = 0;
        for (a, b) in prefix.chars().zip(value.chars()) {
            if a != b {
                break;
            }
            common += a.len_utf8();
        }
        prefix.truncate(common);
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}

pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut previous_diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (previous_diagonal + cost)
                .min(row[j] + 1)
                .min(row[j + 1] + 1);
            previous_diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn candidates(values: &[&str]) -> Vec<Candidate> {
        values.iter().map(|v| Candidate::new(*v)).collect()
    }

    #[test]
    fn exact_prefix_tier_wins() {
        let cands = candidates(&["commit", "checkout", "Clone"]);
        let hit = match_candidates("c", &cands, MatchOptions::default());
        assert_eq!(hit, vec![0, 1]);
    }

    #[test]
    fn case_insensitive_tier_kicks_in_when_exact_fails() {
        let cands = candidates(&["Clone"]);
        let opts = MatchOptions {
            case_insensitive: true,
            ..Default::default()
        };
        assert_eq!(match_candidates("cl", &cands, opts), vec![0]);
        assert!(match_candidates("cl", &cands, MatchOptions::default()).is_empty());
    }

    #[rstest]
    #[case("fB", true)]
    #[case("fooB", true)]
    #[case("fBa", true)]
    #[case("fX", false)]
    fn camel_hump_matching(#[case] word: &str, #[case] hit: bool) {
        let cands = candidates(&["fooBar"]);
        let found = !match_candidates(word, &cands, MatchOptions::default()).is_empty();
        assert_eq!(found, hit);
    }

    #[test]
    fn dashed_names_match_like_humps() {
        let cands = candidates(&["foo-bar"]);
        assert!(!match_candidates("fb", &cands, MatchOptions::default()).is_empty());
    }

    #[test]
    fn typo_tier_tolerates_configured_errors() {
        let cands = candidates(&["checkout"]);
        let opts = MatchOptions {
            typo: true,
            errors: 2,
            ..Default::default()
        };
        assert_eq!(match_candidates("chekc", &cands, opts), vec![0]);
        assert!(match_candidates("xyzzy", &cands, opts).is_empty());
    }

    #[test]
    fn short_words_skip_the_typo_tier() {
        let cands = candidates(&["checkout"]);
        let opts = MatchOptions {
            typo: true,
            errors: 2,
            ..Default::default()
        };
        // Two chars with two tolerated errors would match anything
        assert!(match_candidates("zq", &cands, opts).is_empty());
    }

    #[rstest]
    #[case(&["commit", "checkout", "clone"], "c")]
    #[case(&["checkout", "checkpoint"], "check")]
    #[case(&["same", "same"], "same")]
    fn common_prefix_cases(#[case] values: &[&str], #[case] expected: &str) {
        assert_eq!(common_prefix(values.iter().copied()), expected);
    }

    #[rstest]
    #[case("kitten", "sitting", 3)]
    #[case("abc", "abc", 0)]
    #[case("", "ab", 2)]
    fn edit_distance(#[case] a: &str, #[case] b: &str, #[case] d: usize) {
        assert_eq!(levenshtein(a, b), d);
    }
}
