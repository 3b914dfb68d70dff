use std::sync::LazyLock;

use regex::Regex;

/// `<@U123ABC>`: a user mention as Slack renders it in message text.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([A-Z0-9]+)>").expect("mention pattern is valid"));

/// First mentioned user id, if any.
pub fn extract_user_id(text: &str) -> Option<String> {
    MENTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Every mentioned user id in order of appearance, duplicates kept.
pub fn extract_user_ids(text: &str) -> Vec<String> {
    MENTION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
