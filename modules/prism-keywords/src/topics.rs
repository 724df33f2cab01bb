/// Eight fixed topic buckets, each with a short fixed keyword list. Closed
/// vocabulary — no attempt at stemming or a learned model, matching the
/// cheap-first-stage role this extractor plays in the clustering cascade.
pub const TOPIC_BUCKETS: &[(&str, &[&str])] = &[
    (
        "politics",
        &[
            "election", "senate", "congress", "president", "policy", "legislation",
            "campaign", "governor", "parliament", "vote", "lawmaker", "bill",
        ],
    ),
    (
        "economy",
        &[
            "inflation", "market", "stocks", "jobs", "unemployment", "gdp",
            "recession", "interest rate", "tariff", "trade", "economy", "earnings",
        ],
    ),
    (
        "technology",
        &[
            "ai", "software", "startup", "chip", "data breach", "cybersecurity",
            "app", "smartphone", "algorithm", "silicon valley", "tech", "robot",
        ],
    ),
    (
        "health",
        &[
            "hospital", "vaccine", "disease", "outbreak", "virus", "treatment",
            "fda", "doctor", "patient", "mental health", "pandemic", "drug",
        ],
    ),
    (
        "international",
        &[
            "embassy", "united nations", "treaty", "sanctions", "border",
            "foreign ministry", "diplomat", "summit", "nato", "war", "ceasefire",
        ],
    ),
    (
        "climate",
        &[
            "climate change", "emissions", "wildfire", "drought", "flood",
            "hurricane", "renewable", "carbon", "heatwave", "sea level",
        ],
    ),
    (
        "crime",
        &[
            "arrest", "shooting", "investigation", "police", "trial", "verdict",
            "homicide", "robbery", "fraud", "indictment", "suspect",
        ],
    ),
    (
        "sports",
        &[
            "championship", "tournament", "league", "coach", "playoffs", "match",
            "olympics", "score", "athlete", "stadium", "draft",
        ],
    ),
];

/// Words that signal a breaking-news event regardless of topic; counted
/// into the keyword bag alongside whatever topic keywords matched.
pub const EVENT_KEYWORDS: &[&str] = &[
    "breaking",
    "shooting",
    "announces",
    "confirms",
    "resigns",
    "dies",
    "killed",
    "crash",
    "explosion",
    "earthquake",
    "rescued",
    "arrested",
    "launches",
    "wins",
    "loses",
];
