use serde::Serialize;

use super::types::{Emotion, Reading};

/// Confusion above this level raises the chat's high-confusion indicator.
pub const HIGH_CONFUSION_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmotionBar {
    pub name: &'static str,
    pub value: f64,
}

/// Bars for the real-time emotion chart. Non-dominant emotions show a fixed baseline.
pub fn emotion_breakdown(reading: &Reading) -> Vec<EmotionBar> {
    let bar = |emotion: Emotion, baseline: f64| EmotionBar {
        name: emotion.as_str(),
        value: if reading.dominant_emotion() == emotion {
            reading.face_emotion.score
        } else {
            baseline
        },
    };

    vec![
        bar(Emotion::Happy, 0.1),
        bar(Emotion::Sad, 0.05),
        bar(Emotion::Neutral, 0.2),
        bar(Emotion::Angry, 0.02),
        EmotionBar {
            name: "Confused",
            value: reading.confusion_level / 100.0,
        },
    ]
}

pub fn high_confusion(reading: &Reading) -> bool {
    reading.confusion_level > HIGH_CONFUSION_THRESHOLD
}
