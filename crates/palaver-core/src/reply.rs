//! Rule-based reply generator.
//!
//! Replies come from an ordered table of `(keywords, response)` rules checked
//! top to bottom against the lower-cased message. The first rule with any
//! keyword contained in the message wins, so a message such as "hi, I need
//! help" is a greeting, not a help request.

use serde::Serialize;

/// Which rule a message matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Help,
    Farewell,
    Fallback,
}

/// One row of the reply table.
#[derive(Debug)]
pub struct ReplyRule {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

/// Evaluated in order. Greeting must stay ahead of farewell.
pub const RULES: &[ReplyRule] = &[
    ReplyRule {
        intent: Intent::Greeting,
        keywords: &["hello", "hi"],
        response: "Hello! How can I assist you today?",
    },
    ReplyRule {
        intent: Intent::Help,
        keywords: &["help"],
        response: "I can help you with various tasks. What do you need assistance with?",
    },
    ReplyRule {
        intent: Intent::Farewell,
        keywords: &["bye", "goodbye"],
        response: "Goodbye! Have a great day!",
    },
];

pub const FALLBACK_RESPONSE: &str = "I'm still learning. Can you please rephrase your question?";

fn matching_rule(message: &str) -> Option<&'static ReplyRule> {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
}

/// Classify `message` without producing a reply.
pub fn classify(message: &str) -> Intent {
    matching_rule(message).map_or(Intent::Fallback, |rule| rule.intent)
}

/// Produce the canned reply for `message`. Total and side-effect free.
pub fn generate(message: &str) -> &'static str {
    matching_rule(message).map_or(FALLBACK_RESPONSE, |rule| rule.response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_driven_replies() {
        let cases = [
            ("Hello there", Intent::Greeting),
            ("HI", Intent::Greeting),
            ("can you help me?", Intent::Help),
            ("bye now", Intent::Farewell),
            ("Goodbye!", Intent::Farewell),
            ("what is the weather", Intent::Fallback),
            ("", Intent::Fallback),
        ];
        for (message, expected) in cases {
            assert_eq!(classify(message), expected, "message: {message:?}");
        }
    }

    #[test]
    fn test_greeting_wins_over_help_and_farewell() {
        assert_eq!(classify("hello, help, goodbye"), Intent::Greeting);
        assert_eq!(classify("help me say goodbye"), Intent::Help);
    }

    #[test]
    fn test_keywords_match_as_substrings() {
        // "this" contains "hi"; matching is containment, not whole words.
        assert_eq!(classify("is this thing on"), Intent::Greeting);
    }

    #[test]
    fn test_generate_returns_rule_response() {
        assert_eq!(generate("hello"), "Hello! How can I assist you today?");
        assert_eq!(generate("bye"), "Goodbye! Have a great day!");
        assert_eq!(generate("???"), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate("Help please"), generate("Help please"));
    }

    #[test]
    fn test_rule_order_is_greeting_help_farewell() {
        let order: Vec<Intent> = RULES.iter().map(|r| r.intent).collect();
        assert_eq!(order, vec![Intent::Greeting, Intent::Help, Intent::Farewell]);
    }
}
