//! Regex routing of free text to a backend action.
//!
//! Predicates run in a fixed order and the first one that matches decides the
//! intent. Nothing tries to be clever about several URLs or broken ones: the
//! first URL match is taken verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs at or above this many characters are never treated as searches.
pub const SEARCH_MAX_CHARS: usize = 100;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(https?://[^\s]+)").expect("url pattern is valid"));

static QUESTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?]").expect("question pattern is valid"));

static SEARCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(news|latest|trending|who|what|how|when|why|top)")
        .expect("search pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Answer a question from the pages of a site.
    ScrapeSite { url: String, question: String },
    /// Short lookup that a web search should answer.
    Search { query: String },
    /// Everything else goes to the conversational model.
    Chat { prompt: String },
}

impl Intent {
    /// Wire name of the backend action this intent maps to.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::ScrapeSite { .. } => "scrape_site",
            Intent::Search { .. } => "search",
            Intent::Chat { .. } => "chat",
        }
    }
}

pub fn first_url(text: &str) -> Option<&str> {
    URL_RE.find(text).map(|m| m.as_str())
}

pub fn classify(text: &str) -> Intent {
    let url = first_url(text);
    let is_question = QUESTION_RE.is_match(text);
    let is_likely_search = SEARCH_RE.is_match(text);

    let intent = match url {
        Some(url) if is_question => Intent::ScrapeSite {
            url: url.to_string(),
            question: URL_RE.replace(text, "").trim().to_string(),
        },
        None if is_likely_search && text.chars().count() < SEARCH_MAX_CHARS => Intent::Search {
            query: text.to_string(),
        },
        _ => Intent::Chat {
            prompt: text.to_string(),
        },
    };

    tracing::debug!(action = intent.action(), "classified input");
    intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_question_mark_routes_to_scrape() {
        let intent = classify("What does https://example.com/docs say about pricing?");
        assert_eq!(
            intent,
            Intent::ScrapeSite {
                url: "https://example.com/docs".to_string(),
                question: "What does  say about pricing?".to_string(),
            }
        );
    }

    #[test]
    fn test_question_mark_glued_to_url_stays_in_url() {
        // [^\s]+ swallows the trailing '?', the match is used verbatim
        let intent = classify("summarize http://example.com?");
        assert_eq!(
            intent,
            Intent::ScrapeSite {
                url: "http://example.com?".to_string(),
                question: "summarize".to_string(),
            }
        );
    }

    #[test]
    fn test_first_of_several_urls_wins() {
        match classify("compare https://a.example and https://b.example?") {
            Intent::ScrapeSite { url, question } => {
                assert_eq!(url, "https://a.example");
                assert_eq!(question, "compare  and https://b.example?");
            }
            other => panic!("expected scrape, got {:?}", other),
        }
    }

    #[test]
    fn test_url_scheme_is_case_insensitive() {
        assert_eq!(classify("HTTPS://EXAMPLE.COM what is this?").action(), "scrape_site");
    }

    #[test]
    fn test_url_without_question_is_chat() {
        assert_eq!(
            classify("read https://example.com latest news"),
            Intent::Chat {
                prompt: "read https://example.com latest news".to_string()
            }
        );
    }

    #[test]
    fn test_short_keyword_text_routes_to_search() {
        assert_eq!(
            classify("latest rust news"),
            Intent::Search {
                query: "latest rust news".to_string()
            }
        );
        assert_eq!(classify("Who won the match").action(), "search");
        assert_eq!(classify("TRENDING repos").action(), "search");
    }

    #[test]
    fn test_keyword_question_without_url_is_search() {
        assert_eq!(classify("what is the weather?").action(), "search");
    }

    #[test]
    fn test_keyword_matches_inside_words() {
        // substring match, so "stop" contains "top"
        assert_eq!(classify("please stop").action(), "search");
    }

    #[test]
    fn test_long_keyword_text_is_chat() {
        let text = format!("what {}", "x".repeat(SEARCH_MAX_CHARS));
        assert_eq!(classify(&text).action(), "chat");

        let just_under = format!("why {}", "y".repeat(SEARCH_MAX_CHARS - 5));
        assert_eq!(just_under.chars().count(), SEARCH_MAX_CHARS - 1);
        assert_eq!(classify(&just_under).action(), "search");
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            classify("tell me a joke"),
            Intent::Chat {
                prompt: "tell me a joke".to_string()
            }
        );
    }

    #[test]
    fn test_first_url_helper() {
        assert_eq!(first_url("see http://x.y/z and more"), Some("http://x.y/z"));
        assert_eq!(first_url("ftp://nope"), None);
    }
}
