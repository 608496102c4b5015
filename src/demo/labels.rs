/// Candidate labels scored by the zero-shot demos.
pub const EMOTION_LABELS: [&str; 54] = [
    "happy",
    "sad",
    "angry",
    "fearful",
    "disgusted",
    "surprised",
    "neutral",
    "excited",
    "celebration",
    "grateful",
    "love",
    "motivated",
    "hopeful",
    "proud",
    "relieved",
    "peaceful",
    "optimistic",
    "content",
    "joyful",
    "cheerful",
    "anxious",
    "lonely",
    "tired",
    "frustrated",
    "guilty",
    "embarrassed",
    "jealous",
    "overwhelmed",
    "disappointed",
    "pessimistic",
    "stressed",
    "sadness",
    "confused",
    "curious",
    "nostalgic",
    "thoughtful",
    "shocked",
    "skeptical",
    "doubtful",
    "inspired",
    "amused",
    "indifferent",
    "empathetic",
    "forgiving",
    "resentful",
    "caring",
    "friendly",
    "hostile",
    "bored",
    "calm",
    "relaxed",
    "overjoyed",
    "confident",
    "helpless",
];

/// Label returned for blank input.
pub const NEUTRAL_LABEL: &str = "neutral";

/// Emoji shown next to a label in the styled demo, if it has one.
pub fn emoji_for(label: &str) -> Option<&'static str> {
    let emoji = match label {
        "happy" | "joyful" | "cheerful" => "😊",
        "overjoyed" | "celebration" => "🥳",
        "excited" => "🤩",
        "love" | "caring" => "❤️",
        "grateful" => "🙏",
        "hopeful" | "optimistic" | "inspired" | "motivated" => "🌟",
        "proud" | "confident" => "💪",
        "relieved" | "calm" | "peaceful" | "relaxed" | "content" => "😌",
        "sad" | "sadness" | "disappointed" => "😢",
        "lonely" | "helpless" => "😔",
        "angry" | "hostile" | "resentful" | "frustrated" => "😠",
        "fearful" | "anxious" | "stressed" | "overwhelmed" => "😰",
        "disgusted" => "🤢",
        "surprised" | "shocked" => "😲",
        "tired" | "bored" => "😴",
        "confused" | "doubtful" | "skeptical" => "🤔",
        "curious" | "thoughtful" => "🧐",
        "amused" => "😄",
        "neutral" | "indifferent" => "😐",
        _ => return None,
    };
    Some(emoji)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_unique_and_include_neutral() {
        let unique: HashSet<_> = EMOTION_LABELS.iter().collect();
        assert_eq!(unique.len(), EMOTION_LABELS.len());
        assert!(EMOTION_LABELS.contains(&NEUTRAL_LABEL));
    }

    #[test]
    fn only_some_labels_have_emoji() {
        assert_eq!(emoji_for("happy"), Some("😊"));
        assert_eq!(emoji_for("nostalgic"), None);
        assert_eq!(emoji_for("not-a-label"), None);
    }
}
