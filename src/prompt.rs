//! Instruction text sent to the completion service.

use crate::sentiment::SentimentLabel;

/// Mood phrase used in the prompt for each label.
pub fn descriptor(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Negative => "feeling sad or upset",
        SentimentLabel::Neutral => "feeling okay or neutral",
        SentimentLabel::Positive => "feeling happy or content",
    }
}

/// Build the generation prompt for an utterance and its label.
///
/// Deterministic: the same inputs always give the same prompt.
pub fn build_prompt(user_text: &str, label: SentimentLabel) -> String {
    format!(
        "The user said: \"{user_text}\".\n\
         They are {mood}.\n\
         Respond as a compassionate, empathetic listener in a supportive way. \
         Don't use metaphors, and use simple, easy to understand words. \
         Keep it short, 2-3 sentences at most.\n",
        mood = descriptor(label),
    )
}
