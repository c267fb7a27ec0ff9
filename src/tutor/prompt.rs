use crate::metrics::Reading;

pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm having trouble thinking right now. Let's try that again.";
pub const CONNECTION_FALLBACK: &str =
    "I lost connection to my brain for a moment. Please check your API key or internet.";

/// Tutoring persona and emotion-adaptation policy, fixed for the life of a chat session.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert tutor inside an emotion-aware learning system.

Your goal is to help the student learn while adapting to their emotional state and engagement.

Each student turn starts with a context block giving their current emotion, engagement and confusion, followed by what the student said.

Guidelines:
- Emotion Happy or Neutral with high engagement: challenge the student, go deeper, keep the momentum.
- Emotion Sad, Angry or Fear, or low engagement: slow down, simplify, offer encouragement, and consider suggesting a short break or a different angle.
- High confusion: re-explain the previous concept with an analogy.
- Keep answers concise, helpful and encouraging.
- Do not quote the metrics back to the student unless it helps empathy (for example \"You seem a bit stuck...\").";

/// Percentages and scores are rounded half away from zero.
fn whole(value: f64) -> i64 {
    value.round() as i64
}

/// Context block describing the reading, followed by the student's words.
pub fn build_context_prompt(text: &str, reading: &Reading) -> String {
    format!(
        "[SYSTEM CONTEXT]\n\
         Current Emotion: {} ({}%)\n\
         Engagement Score: {}/100\n\
         Confusion Level: {}/100\n\
         [END CONTEXT]\n\
         \n\
         Student says: \"{}\"",
        reading.face_emotion.emotion,
        whole(reading.face_emotion.score * 100.0),
        whole(reading.engagement_score),
        whole(reading.confusion_level),
        text
    )
}
