//! Topic → button routing for inbound bus messages.

use crate::config::ButtonDefinition;

/// Indices of every output-mode button whose topic equals `topic`,
/// in list order. Duplicate topics fan out: each match gets its own
/// pulse, executed sequentially by the caller.
pub fn matches(buttons: &[ButtonDefinition], topic: &str) -> Vec<usize> {
    buttons
        .iter()
        .enumerate()
        .filter(|(_, b)| b.mode.is_output() && b.topic == topic)
        .map(|(i, _)| i)
        .collect()
}

/// Deduplicated subscription set: the topic of every output-mode button.
/// Input buttons carry no bus semantics and are never subscribed.
pub fn subscription_topics(buttons: &[ButtonDefinition]) -> Vec<&str> {
    let mut topics: Vec<&str> = Vec::new();
    for button in buttons {
        if button.mode.is_output() && !topics.contains(&button.topic.as_str()) {
            topics.push(&button.topic);
        }
    }
    topics
}
