use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Titled person: an honorific followed by one or more capitalised words.
static TITLED_PERSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Sen|Rep|Gov|Pres|Sec|Gen|Judge|President|Senator|Governor|Minister|Mayor)\.?\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+){0,2})")
        .expect("invalid titled-person regex")
});

/// Organisation/company: capitalised word sequence ending in a corporate
/// suffix.
static ORGANIZATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-zA-Z&'-]*(?:\s+[A-Z][a-zA-Z&'-]*){0,3}\s+(?:Inc|Corp|LLC|Ltd|Co|Group|Co\.|Corp\.|Inc\.))\b")
        .expect("invalid organization regex")
});

/// Monetary amount: a currency symbol/word followed by a number, with an
/// optional magnitude word (million/billion/trillion).
static MONETARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\s?\d[\d,]*(?:\.\d+)?\s?(?:million|billion|trillion)?")
        .expect("invalid monetary regex")
});

/// Date: "Month Day[, Year]" or "Day Month Year".
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:,?\s+\d{4})?\b")
        .expect("invalid date regex")
});

/// Quoted phrase: text between straight double quotes.
static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]{3,80})""#).expect("invalid quoted-phrase regex"));

/// Multi-word capitalised span not already covered by a more specific
/// pattern above — the catch-all for place names and proper nouns the
/// other patterns miss.
static CAPITALIZED_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})\b").expect("invalid capitalized-span regex")
});

/// Extract a case-folded set of entity strings from free text, combining
/// every fixed pattern. Quoted phrases keep their original casing collapsed
/// to lowercase like everything else, since entities feed into a Jaccard
/// comparison where case must not matter.
pub fn extract_entities(text: &str) -> HashSet<String> {
    let mut found = HashSet::new();

    for pattern in [&TITLED_PERSON, &ORGANIZATION] {
        for cap in pattern.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                found.insert(m.as_str().to_lowercase());
            }
        }
    }

    for m in MONETARY.find_iter(text) {
        found.insert(m.as_str().to_lowercase());
    }

    for m in DATE.find_iter(text) {
        found.insert(m.as_str().to_lowercase());
    }

    for cap in QUOTED.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            found.insert(m.as_str().to_lowercase());
        }
    }

    for cap in CAPITALIZED_SPAN.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            found.insert(m.as_str().to_lowercase());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_titled_person() {
        let entities = extract_entities("Sen. Maria Alvarez proposed the bill on Tuesday");
        assert!(entities.contains("maria alvarez"));
    }

    #[test]
    fn extracts_monetary_amount() {
        let entities = extract_entities("The deal is worth $4.2 billion to shareholders");
        assert!(entities.iter().any(|e| e.contains("4.2 billion")));
    }

    #[test]
    fn extracts_quoted_phrase() {
        let entities = extract_entities(r#"The mayor called it "a turning point for the city""#);
        assert!(entities.contains("a turning point for the city"));
    }

    #[test]
    fn extracts_date() {
        let entities = extract_entities("The summit is scheduled for March 14, 2026");
        assert!(entities.contains("march 14, 2026"));
    }

    #[test]
    fn extracts_multiword_capitalized_span_as_place() {
        let entities = extract_entities("Flooding hit parts of South Carolina overnight");
        assert!(entities.contains("south carolina"));
    }
}
