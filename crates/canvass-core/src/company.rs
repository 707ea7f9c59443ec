//! Company token resolution.
//!
//! Respondents type their company name freely. [`resolve_company_token`]
//! maps that text onto a token already in use when it is the same company
//! spelt differently (case, punctuation, acronym, small typos or a different
//! legal suffix), so that reports aggregate all of a company's surveys.
//!
//! Resolution is a pure function of the candidate and every token recorded so
//! far; nothing is cached between calls.

use similar::TextDiff;

/// Minimum similarity for the fuzzy step.
pub const FUZZY_CUTOFF: f32 = 0.80;

/// Trailing words that name a legal form rather than the company itself.
const LEGAL_SUFFIXES: &[&str] = &[
  "co",
  "company",
  "corp",
  "corporation",
  "gmbh",
  "inc",
  "incorporated",
  "limited",
  "llc",
  "ltd",
  "plc",
];

/// Resolve `candidate` against `existing` tokens. First match wins:
///
/// 1. no tokens yet: the trimmed, title-cased candidate becomes canonical;
/// 2. normalized forms are equal;
/// 3. one side is the acronym of the other (`GTB` ↔ `Guaranty Trust Bank`);
/// 4. the closest token with similarity of at least [`FUZZY_CUTOFF`];
/// 5. otherwise the trimmed candidate is a new token.
pub fn resolve_company_token(candidate: &str, existing: &[String]) -> String {
  let trimmed = candidate.trim();
  let norm = normalize(trimmed);

  if existing.is_empty() {
    return title_case(trimmed);
  }
  if norm.is_empty() {
    return trimmed.to_owned();
  }

  if let Some(token) = existing.iter().find(|t| normalize(t) == norm) {
    return token.clone();
  }

  let candidate_acronym = acronym(trimmed);
  if let Some(token) = existing.iter().find(|t| {
    let token_acronym = acronym(t);
    (token_acronym.len() >= 2 && token_acronym == norm)
      || (candidate_acronym.len() >= 2 && candidate_acronym == normalize(t))
  }) {
    return token.clone();
  }

  if let Some(token) = closest_match(trimmed, existing) {
    return token.clone();
  }

  trimmed.to_owned()
}

/// Lower-case and drop everything that is not a letter or digit.
pub fn normalize(name: &str) -> String {
  name
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

/// First letter of every alphabetic run, lower-cased.
pub fn acronym(name: &str) -> String {
  let mut out = String::new();
  let mut in_run = false;
  for c in name.chars() {
    if c.is_alphabetic() {
      if !in_run {
        out.extend(c.to_lowercase());
      }
      in_run = true;
    } else {
      in_run = false;
    }
  }
  out
}

/// Similarity of two company names in `0.0..=1.0`: the better of the plain
/// normalized comparison and the comparison with legal suffixes removed.
pub fn similarity(a: &str, b: &str) -> f32 {
  let plain = ratio(&normalize(a), &normalize(b));
  let core = ratio(&normalize(&strip_legal_suffix(a)), &normalize(&strip_legal_suffix(b)));
  plain.max(core)
}

fn ratio(a: &str, b: &str) -> f32 {
  if a.is_empty() && b.is_empty() {
    return 1.0;
  }
  TextDiff::from_chars(a, b).ratio()
}

/// The highest-scoring token at or above the cutoff; earliest wins ties.
fn closest_match<'a>(candidate: &str, existing: &'a [String]) -> Option<&'a String> {
  let mut best: Option<(&String, f32)> = None;
  for token in existing {
    let score = similarity(candidate, token);
    if score < FUZZY_CUTOFF {
      continue;
    }
    if best.is_none_or(|(_, s)| score > s) {
      best = Some((token, score));
    }
  }
  best.map(|(token, _)| token)
}

/// Drop trailing legal-form words, keeping at least one word.
fn strip_legal_suffix(name: &str) -> String {
  let mut words: Vec<&str> = name.split_whitespace().collect();
  while words.len() > 1 {
    let last = normalize(words[words.len() - 1]);
    if LEGAL_SUFFIXES.contains(&last.as_str()) {
      words.pop();
    } else {
      break;
    }
  }
  words.join(" ")
}

/// Upper-case the first letter of every word and lower-case the rest.
fn title_case(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut prev_is_letter = false;
  for c in name.chars() {
    if prev_is_letter {
      out.extend(c.to_lowercase());
    } else {
      out.extend(c.to_uppercase());
    }
    prev_is_letter = c.is_alphabetic();
  }
  out
}
