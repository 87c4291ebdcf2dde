//! In-character replies used when no model answers.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::persona::Persona;

/// Line used only when a persona was stored without usable fallback lines.
pub const DEFAULT_FALLBACK_LINE: &str = "*pauses mid-thought* ...where was I? Say that once more.";

/// Pick one of the persona's fallback lines uniformly at random.
pub fn fallback_line(persona: &Persona) -> String {
    fallback_line_with(persona, &mut rand::thread_rng())
}

/// Same as [`fallback_line`] with a caller-supplied random source.
pub fn fallback_line_with<R: Rng + ?Sized>(persona: &Persona, rng: &mut R) -> String {
    let usable: Vec<&String> = persona
        .fallback_lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    match usable.choose(rng) {
        Some(line) => (*line).clone(),
        None => {
            warn!(persona = %persona.id, "Persona has no usable fallback lines, using default");
            DEFAULT_FALLBACK_LINE.to_string()
        }
    }
}
