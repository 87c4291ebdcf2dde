//! Persona definitions and their JSON form.

use serde::{Deserialize, Serialize};

use crate::error::PersonaError;

/// Provider names a fallback line must never mention.
///
/// Covers the built-in provider families only. Providers added under
/// another name through `ProviderSettings::with_name` are not checked.
pub const FORBIDDEN_PROVIDER_NAMES: &[&str] = &["openrouter", "gemini"];

/// Sampling parameters an author chose for a persona.
///
/// Stored as authored. The assembler clamps them before anything reaches a
/// provider, see [`clamp_params`](crate::clamp_params).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Create generation parameters.
    pub fn new(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.7, 400)
    }
}

/// An addressable character definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Opaque identifier.
    pub id: String,
    /// Name shown to users and to other personas.
    pub display_name: String,
    /// Who the persona is and how it behaves.
    pub system_instruction: String,
    /// Optional voice/format guidance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_hints: Option<String>,
    /// Sampling parameters.
    #[serde(default)]
    pub generation_params: GenerationParams,
    /// In-character lines used when no model answers.
    pub fallback_lines: Vec<String>,
}

impl Persona {
    /// Check the authoring invariants.
    ///
    /// Applied on import. The gateway itself tolerates out-of-range
    /// generation parameters because the assembler clamps them.
    pub fn validate(&self) -> Result<(), PersonaError> {
        if self.id.trim().is_empty() {
            return Err(PersonaError::EmptyId);
        }

        if self.system_instruction.trim().is_empty() {
            return Err(PersonaError::EmptySystemInstruction);
        }

        let temperature = self.generation_params.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(PersonaError::TemperatureOutOfRange(temperature));
        }

        let max_tokens = self.generation_params.max_output_tokens;
        if !(128..=4096).contains(&max_tokens) {
            return Err(PersonaError::MaxOutputTokensOutOfRange(max_tokens));
        }

        if self.fallback_lines.is_empty() {
            return Err(PersonaError::NoFallbackLines);
        }

        for (index, line) in self.fallback_lines.iter().enumerate() {
            if line.trim().is_empty() {
                return Err(PersonaError::BlankFallbackLine(index));
            }
            if let Some(word) = contains_forbidden_word(line) {
                return Err(PersonaError::ForbiddenFallbackWord { index, word });
            }
        }

        Ok(())
    }

    /// Serialize to the JSON export format.
    pub fn to_json(&self) -> Result<String, PersonaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a persona from the JSON export format.
    pub fn from_json(json: &str) -> Result<Self, PersonaError> {
        let persona: Persona = serde_json::from_str(json)?;
        persona.validate()?;
        Ok(persona)
    }
}

/// Return the first forbidden word found in a fallback line, if any.
///
/// "error" and provider names match anywhere (case-insensitive); "API" only
/// as a whole word so that e.g. "capital" stays legal.
pub fn contains_forbidden_word(line: &str) -> Option<String> {
    let lower = line.to_lowercase();

    if lower.contains("error") {
        return Some("error".to_string());
    }

    if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "api" || word == "apis")
    {
        return Some("API".to_string());
    }

    FORBIDDEN_PROVIDER_NAMES
        .iter()
        .find(|name| lower.contains(*name))
        .map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pip() -> Persona {
        Persona {
            id: "pip".to_string(),
            display_name: "Pip".to_string(),
            system_instruction: "You are Pip, a wooden puppet.".to_string(),
            style_hints: Some("Short sentences, stage directions in asterisks.".to_string()),
            generation_params: GenerationParams::new(0.7, 400),
            fallback_lines: vec![
                "*adjusts hat* the world hiccuped, say that again?".to_string(),
                "the gears of the world skipped a beat".to_string(),
            ],
        }
    }

    #[test]
    fn test_valid_persona() {
        assert!(pip().validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let original = pip();
        let json = original.to_json().unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"maxOutputTokens\""));

        let restored = Persona::from_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_json_missing_style_hints() {
        let json = r#"{
            "id": "mags",
            "displayName": "Mags",
            "systemInstruction": "You are Mags.",
            "generationParams": {"temperature": 0.4, "maxOutputTokens": 256},
            "fallbackLines": ["Hm. Again?"]
        }"#;

        let persona = Persona::from_json(json).unwrap();
        assert!(persona.style_hints.is_none());
        assert_eq!(persona.generation_params.max_output_tokens, 256);
    }

    #[test]
    fn test_rejects_empty_system_instruction() {
        let mut persona = pip();
        persona.system_instruction = "   ".to_string();
        assert!(matches!(
            persona.validate(),
            Err(PersonaError::EmptySystemInstruction)
        ));
    }

    #[test]
    fn test_rejects_out_of_range_params() {
        let mut persona = pip();
        persona.generation_params.temperature = 2.5;
        assert!(matches!(
            persona.validate(),
            Err(PersonaError::TemperatureOutOfRange(_))
        ));

        let mut persona = pip();
        persona.generation_params.max_output_tokens = 10_000;
        assert!(matches!(
            persona.validate(),
            Err(PersonaError::MaxOutputTokensOutOfRange(10_000))
        ));
    }

    #[test]
    fn test_rejects_missing_fallback_lines() {
        let mut persona = pip();
        persona.fallback_lines.clear();
        assert!(matches!(persona.validate(), Err(PersonaError::NoFallbackLines)));
    }

    #[test]
    fn test_rejects_blank_fallback_line() {
        let json = r#"{
            "id": "mags",
            "displayName": "Mags",
            "systemInstruction": "You are Mags.",
            "fallbackLines": ["   "]
        }"#;

        assert!(matches!(
            Persona::from_json(json),
            Err(PersonaError::BlankFallbackLine(0))
        ));

        let mut persona = pip();
        persona.fallback_lines.push(String::new());
        assert!(matches!(
            persona.validate(),
            Err(PersonaError::BlankFallbackLine(2))
        ));
    }

    #[test]
    fn test_rejects_leaky_fallback_lines() {
        let mut persona = pip();
        persona.fallback_lines.push("Sorry, an Error occurred".to_string());
        match persona.validate() {
            Err(PersonaError::ForbiddenFallbackWord { index, word }) => {
                assert_eq!(index, 2);
                assert_eq!(word, "error");
            }
            other => panic!("Expected ForbiddenFallbackWord, got {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_word_detection() {
        assert_eq!(contains_forbidden_word("the API is down"), Some("API".to_string()));
        assert_eq!(
            contains_forbidden_word("Gemini went quiet"),
            Some("gemini".to_string())
        );
        assert_eq!(contains_forbidden_word("the capital of dreams"), None);
        assert_eq!(contains_forbidden_word("*tips hat*"), None);
    }
}
