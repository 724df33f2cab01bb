use std::collections::HashSet;

use crate::topics::{EVENT_KEYWORDS, TOPIC_BUCKETS};

/// The three bags this extractor produces for one article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordBag {
    pub topics: HashSet<String>,
    pub keywords: HashSet<String>,
    pub entities: HashSet<String>,
}

/// Build a keyword bag from an article's title + summary, case-folded.
pub fn extract(text: &str) -> KeywordBag {
    let lower = text.to_lowercase();
    let mut topics = HashSet::new();
    let mut keywords = HashSet::new();

    for (bucket, words) in TOPIC_BUCKETS {
        let mut matched = false;
        for word in *words {
            if lower.contains(word) {
                matched = true;
                keywords.insert(word.to_string());
            }
        }
        if matched {
            topics.insert(bucket.to_string());
        }
    }

    for word in EVENT_KEYWORDS {
        if lower.contains(word) {
            keywords.insert(word.to_string());
        }
    }

    let entities = crate::entities::extract_entities(text);

    KeywordBag {
        topics,
        keywords,
        entities,
    }
}
