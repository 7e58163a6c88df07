//! Interaction Scorer: a deterministic quality estimate for one turn.

use crate::schema::lookup;
use crate::state::ConfigState;

/// The user signalled they are satisfied.
pub const SATISFIED_SCORE: f32 = 0.9;
/// Neither satisfied nor asking for corrections.
pub const NEUTRAL_SCORE: f32 = 0.7;
/// The user asked to correct something.
pub const CORRECTION_SCORE: f32 = 0.4;
/// Ceiling for turns that leave the whole configuration unset.
pub const EMPTY_RESULT_CEILING: f32 = 0.5;

const SATISFIED_PHRASES: &[&str] = &[
    "no further changes",
    "no further adjustment",
    "no adjustment",
    "no changes",
    "no change",
    "looks good",
];

const CORRECTION_WORDS: &[&str] = &["adjust", "change", "wrong"];

/// Score a turn in `[0, 1]`.
///
/// Satisfaction phrases are checked before correction words, since phrases
/// like "no changes" contain a correction word. A turn whose resulting
/// state has every field at the sentinel is capped at
/// [`EMPTY_RESULT_CEILING`], which keeps it out of the curated corpus.
pub fn score(user_text: &str, state: &ConfigState) -> f32 {
    let text = user_text.to_lowercase();

    let base = if SATISFIED_PHRASES.iter().any(|p| text.contains(p)) {
        SATISFIED_SCORE
    } else if CORRECTION_WORDS.iter().any(|w| text.contains(w)) {
        CORRECTION_SCORE
    } else {
        NEUTRAL_SCORE
    };

    if state.is_unset(lookup(state.domain()).sentinel) {
        base.min(EMPTY_RESULT_CEILING)
    } else {
        base
    }
}
