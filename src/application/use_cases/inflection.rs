//! Rule-based English singular/plural forms for schema identifiers.
//!
//! Only needs to be good enough for table and column names ("vessels",
//! "work_orders", "status"); it never touches the database.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static UNCOUNTABLE: &[&str] = &[
    "data", "equipment", "information", "metadata", "news", "series", "species", "sheep",
    "deer", "fish", "staff", "feedback", "software", "hardware", "maintenance", "personnel",
];

/// singular -> plural for words the suffix rules get wrong.
static IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("criterion", "criteria"),
    ("analysis", "analyses"),
    ("diagnosis", "diagnoses"),
    ("crisis", "crises"),
    ("thesis", "theses"),
    ("leaf", "leaves"),
    ("half", "halves"),
    ("shelf", "shelves"),
    ("wolf", "wolves"),
    ("calf", "calves"),
    ("loaf", "loaves"),
    ("thief", "thieves"),
    ("knife", "knives"),
    ("life", "lives"),
    ("wife", "wives"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
    ("echo", "echoes"),
    ("cargo", "cargoes"),
];

/// Singular words that end in a plain `s`.
static S_SINGULARS: &[&str] = &["gas", "alias", "bias", "atlas", "canvas", "lens"];

static PLURAL_TO_SINGULAR: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| IRREGULAR.iter().map(|(s, p)| (*p, *s)).collect());

static SINGULAR_TO_PLURAL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| IRREGULAR.iter().copied().collect());

fn is_uncountable(word: &str) -> bool {
    UNCOUNTABLE.iter().any(|w| word.ends_with(w))
}

fn is_vowel(c: char) -> bool {
    "aeiou".contains(c)
}

/// `word` is `target` itself or ends in `_target`.
fn ends_with_word(word: &str, target: &str) -> bool {
    match word.strip_suffix(target) {
        Some(head) => head.is_empty() || head.ends_with('_'),
        None => false,
    }
}

fn is_s_singular(word: &str) -> bool {
    S_SINGULARS.iter().any(|w| ends_with_word(word, w))
}

/// Singular of a word ending in `es`; `base` is the word without that `es`.
fn singularize_es(word: &str, base: &str) -> Option<String> {
    if is_s_singular(base) {
        return Some(base.to_string());
    }
    if ["ss", "sh", "x", "zz"].iter().any(|suffix| base.ends_with(suffix)) {
        return Some(base.to_string());
    }
    let without_s = &word[..word.len() - 1];
    // matches -> match, branches -> branch, coaches -> coach, but caches -> cache
    if let Some(stem) = base.strip_suffix("ch") {
        let mut before = stem.chars().rev();
        let keep_e = match (before.next(), before.next()) {
            (Some(last), _) if !is_vowel(last) => false,
            (Some(_), Some(prev)) if is_vowel(prev) => false,
            _ => true,
        };
        return Some(if keep_e { without_s } else { base }.to_string());
    }
    // statuses -> status, buses -> bus, but houses -> house
    if let Some(stem) = base.strip_suffix("us") {
        let after_consonant = stem.chars().last().is_some_and(|c| !is_vowel(c));
        return Some(if after_consonant { base } else { without_s }.to_string());
    }
    None
}

fn ends_with_consonant_y(word: &str) -> bool {
    let mut chars = word.chars().rev();
    matches!(
        (chars.next(), chars.next()),
        (Some('y'), Some(c)) if !"aeiou".contains(c)
    )
}

/// Singular form of `word`; words that already look singular come back unchanged.
pub fn singularize(word: &str) -> String {
    if word.is_empty() || is_uncountable(word) {
        return word.to_string();
    }
    if let Some(singular) = PLURAL_TO_SINGULAR.get(word) {
        return singular.to_string();
    }

    if is_s_singular(word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() > 1 {
            return format!("{stem}y");
        }
    }
    if let Some(base) = word.strip_suffix("es") {
        if let Some(singular) = singularize_es(word, base) {
            return singular;
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Plural form of `word`; words that already look plural come back unchanged.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() || is_uncountable(word) {
        return word.to_string();
    }
    if let Some(plural) = SINGULAR_TO_PLURAL.get(word) {
        return plural.to_string();
    }
    if PLURAL_TO_SINGULAR.contains_key(word) || singularize(word) != word {
        return word.to_string();
    }

    if ends_with_consonant_y(word) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if word.ends_with("is") {
        return format!("{}es", &word[..word.len() - 2]);
    }
    if ["s", "sh", "ch", "x", "z"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// The {verbatim, singular, plural} variant set, lowercased and deduplicated.
/// Order is fixed: verbatim first, then singular, then plural.
pub fn lexical_variants(word: &str) -> Vec<String> {
    let verbatim = word.to_lowercase();
    let mut variants = vec![verbatim.clone()];
    for form in [singularize(&verbatim), pluralize(&verbatim)] {
        if !variants.contains(&form) {
            variants.push(form);
        }
    }
    variants
}
