use serde::{Deserialize, Serialize};

/// Speaker gender attribute of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceGender {
    /// Female-presenting voice.
    Female,
    /// Male-presenting voice.
    Male,
}

/// Attribute data carried by every [`Voice`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceInfo {
    /// Identifier used to derive library keys such as `"<id>_giggle1"`.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Gender attribute.
    pub gender: VoiceGender,
    /// Synthesis cost in USD per million characters.
    pub usd_per_million_chars: f64,
}

/// Closed set of speaking voices an actor can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    /// Upbeat male voice.
    Puck,
    /// Firm female voice.
    Kore,
    /// Bright female voice.
    Leda,
    /// Informative male voice.
    Charon,
}

impl Voice {
    /// Every voice, in declaration order.
    pub const ALL: [Voice; 4] = [Voice::Puck, Voice::Kore, Voice::Leda, Voice::Charon];

    /// Attribute table for this voice.
    pub fn info(self) -> VoiceInfo {
        match self {
            Voice::Puck => VoiceInfo {
                id: "puck",
                display_name: "Puck",
                gender: VoiceGender::Male,
                usd_per_million_chars: 16.0,
            },
            Voice::Kore => VoiceInfo {
                id: "kore",
                display_name: "Kore",
                gender: VoiceGender::Female,
                usd_per_million_chars: 16.0,
            },
            Voice::Leda => VoiceInfo {
                id: "leda",
                display_name: "Leda",
                gender: VoiceGender::Female,
                usd_per_million_chars: 16.0,
            },
            Voice::Charon => VoiceInfo {
                id: "charon",
                display_name: "Charon",
                gender: VoiceGender::Male,
                usd_per_million_chars: 16.0,
            },
        }
    }

    /// Library key of this voice's laugh reaction.
    pub fn reaction_sequence_id(self) -> String {
        format!("{}_giggle1", self.info().id)
    }

    /// Estimated synthesis cost of `text` in USD.
    pub fn estimate_cost_usd(self, text: &str) -> f64 {
        text.chars().count() as f64 * self.info().usd_per_million_chars / 1_000_000.0
    }
}
