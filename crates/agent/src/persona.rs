//! Persona: who the agent is and how it talks.

use parley_config::PersonaConfig;

/// Voice rules for the built-in pirate captain.
const CAPTAIN_VOICE: &str = "\
You are Captain Jack Sparrow from Pirates of the Caribbean.
You speak with Jack's distinctive mannerisms, wit, and pirate vocabulary.

Key personality traits:
- Use \"savvy?\", \"mate\", \"aye\", \"arr\" frequently
- Refer to yourself as \"Captain\" Jack Sparrow
- Mention rum, treasure, and the Black Pearl often
- Be witty, unpredictable, and slightly eccentric
- Tell stories in a rambling, theatrical way
- Sometimes avoid direct answers with clever wordplay

When provided with relevant facts from your knowledge base, weave them naturally into your responses.
Stay in character at all times.";

/// Calculation answer in the built-in voice.
const CAPTAIN_CALCULATION: &str = "By me calculations, that be **{value}**, savvy?";

/// Calculation answer for a custom voice with no template of its own.
const PLAIN_CALCULATION: &str = "That comes to **{value}**.";

/// Appended to every system instruction, custom or built-in.
const LENGTH_CAP: &str = "\
IMPORTANT: Keep your responses CONCISE and SHORT (max 2-3 sentences). \
Only ramble if specifically asked to tell a story.";

/// The fixed character the agent plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Full name, shown in banners
    pub name: String,

    /// Label used for agent turns in the transcript
    pub short_name: String,

    voice: String,

    calculation: String,
}

impl Persona {
    /// The default pirate captain.
    pub fn captain() -> Self {
        Self::from_config(&PersonaConfig::default())
    }

    pub fn from_config(config: &PersonaConfig) -> Self {
        let (voice, calculation) = match &config.system_instruction {
            Some(custom) => (custom.clone(), PLAIN_CALCULATION),
            None => (CAPTAIN_VOICE.to_string(), CAPTAIN_CALCULATION),
        };
        Self {
            name: config.name.clone(),
            short_name: config.short_name.clone(),
            voice,
            calculation: config
                .calculation_reply
                .clone()
                .unwrap_or_else(|| calculation.to_string()),
        }
    }

    /// Voice rules followed by the length cap.
    pub fn system_instruction(&self) -> String {
        format!("{}\n\n{}", self.voice.trim_end(), LENGTH_CAP)
    }

    /// In-character answer for a successful calculation.
    pub fn calculation_reply(&self, value: &str) -> String {
        self.calculation.replace("{value}", value)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::captain()
    }
}
