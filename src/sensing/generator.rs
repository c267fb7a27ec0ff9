use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::metrics::{
    Emotion, FaceEmotion, Reading, BLINK_MAX, BLINK_MIN, FACE_SCORE_MAX, FACE_SCORE_MIN,
    PERCENT_MAX, PERCENT_MIN, VOICE_MAX, VOICE_MIN,
};

use super::drift::drift;

/// Chance per tick that the dominant emotion is re-drawn.
pub const EMOTION_SWITCH_PROBABILITY: f64 = 0.05;
/// Share of the next engagement taken from its own drift; the rest follows `100 - confusion`.
pub const ENGAGEMENT_DRIFT_WEIGHT: f64 = 0.9;

const FACE_VOLATILITY: f64 = 0.1;
const VOICE_VOLATILITY: f64 = 0.2;
const CONFUSION_VOLATILITY: f64 = 10.0;
const ENGAGEMENT_VOLATILITY: f64 = 5.0;
const BLINK_VOLATILITY: f64 = 2.0;

/// Produces believable sensor noise by drifting each field from the previous reading.
#[derive(Debug, Clone)]
pub struct MetricsGenerator<R = StdRng> {
    rng: R,
}

impl MetricsGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> MetricsGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_reading(&mut self, prev: &Reading, now: DateTime<Utc>) -> Reading {
        let rng = &mut self.rng;

        let mut emotion = prev.face_emotion.emotion;
        if rng.gen_bool(EMOTION_SWITCH_PROBABILITY) {
            emotion = Emotion::ALL[rng.gen_range(0..Emotion::ALL.len())];
        }

        let confusion = drift(
            rng,
            prev.confusion_level,
            PERCENT_MIN,
            PERCENT_MAX,
            CONFUSION_VOLATILITY,
        );
        let drifted_engagement = drift(
            rng,
            prev.engagement_score,
            PERCENT_MIN,
            PERCENT_MAX,
            ENGAGEMENT_VOLATILITY,
        );
        let engagement = couple_engagement(drifted_engagement, confusion);

        let score = drift(
            rng,
            prev.face_emotion.score,
            FACE_SCORE_MIN,
            FACE_SCORE_MAX,
            FACE_VOLATILITY,
        );
        let voice = drift(
            rng,
            prev.voice_emotion_score,
            VOICE_MIN,
            VOICE_MAX,
            VOICE_VOLATILITY,
        );
        let blink = drift(rng, prev.blink_rate, BLINK_MIN, BLINK_MAX, BLINK_VOLATILITY);

        Reading {
            timestamp: now.max(prev.timestamp),
            face_emotion: FaceEmotion { emotion, score },
            voice_emotion_score: voice,
            engagement_score: engagement,
            confusion_level: confusion,
            blink_rate: blink,
        }
    }
}

/// Pull drifted engagement toward `100 - confusion`. High confusion drags engagement down.
pub fn couple_engagement(drifted_engagement: f64, confusion: f64) -> f64 {
    let target = PERCENT_MAX - confusion;
    (drifted_engagement * ENGAGEMENT_DRIFT_WEIGHT + target * (1.0 - ENGAGEMENT_DRIFT_WEIGHT))
        .clamp(PERCENT_MIN, PERCENT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn dominant_emotion_is_sticky() {
        let mut generator = MetricsGenerator::seeded(2024);
        let start = Utc::now();
        let mut prev = Reading::seed(start);
        let mut changes = 0u32;
        let ticks = 10_000;

        for i in 0..ticks {
            let next = generator.next_reading(&prev, start + Duration::seconds(i + 1));
            assert!(Emotion::ALL.contains(&next.dominant_emotion()));
            if next.dominant_emotion() != prev.dominant_emotion() {
                changes += 1;
            }
            prev = next;
        }

        // A re-draw lands on the same label 1 time in 7, so ~4.3% of ticks change.
        let rate = changes as f64 / ticks as f64;
        assert!((0.03..=0.065).contains(&rate), "change rate {rate}");
    }

    #[test]
    fn every_label_is_reachable() {
        let mut generator = MetricsGenerator::seeded(9);
        let now = Utc::now();
        let mut prev = Reading::seed(now);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20_000 {
            prev = generator.next_reading(&prev, now);
            seen.insert(prev.dominant_emotion());
        }
        assert_eq!(seen.len(), Emotion::ALL.len());
    }

    #[test]
    fn confusion_spike_lowers_engagement() {
        for drifted in [0.0, 42.5, 85.0, 100.0] {
            let calm = couple_engagement(drifted, 10.0);
            let confused = couple_engagement(drifted, 90.0);
            assert!(confused < calm, "drifted {drifted}: {confused} !< {calm}");
        }
        assert!((couple_engagement(85.0, 10.0) - 85.5).abs() < 1e-9);
    }

    #[test]
    fn same_draws_with_higher_confusion_give_lower_engagement() {
        let now = Utc::now();
        let calm = Reading::seed(now);
        let mut confused = calm;
        confused.confusion_level = 90.0;

        let next_calm = MetricsGenerator::seeded(77).next_reading(&calm, now);
        let next_confused = MetricsGenerator::seeded(77).next_reading(&confused, now);
        assert!(next_confused.engagement_score < next_calm.engagement_score);
    }

    #[test]
    fn timestamp_never_goes_backwards() {
        let mut generator = MetricsGenerator::seeded(1);
        let now = Utc::now();
        let prev = Reading::seed(now);
        let next = generator.next_reading(&prev, now - Duration::seconds(5));
        assert_eq!(next.timestamp, now);
        let later = generator.next_reading(&next, now + Duration::seconds(1));
        assert_eq!(later.timestamp, now + Duration::seconds(1));
    }
}
