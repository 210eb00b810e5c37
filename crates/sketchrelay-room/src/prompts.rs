//! Fallback prompts for players who submit nothing.

use rand::Rng;

const FALLBACK_PROMPTS: &[&str] = &[
    "a cat wearing a crown",
    "a haunted toaster",
    "a dragon at the dentist",
    "a snowman on vacation",
    "a robot learning to dance",
    "a pirate ship in a bathtub",
    "an octopus playing drums",
    "a wizard stuck in traffic",
    "a penguin delivering mail",
    "a volcano made of ice cream",
    "a ghost doing yoga",
    "a giraffe in a submarine",
    "a knight fighting a pigeon",
    "an alien at a yard sale",
    "a tree with a mustache",
    "a dog running for president",
    "a teapot in outer space",
    "a vampire at the beach",
    "a cactus giving a hug",
    "a shark at a birthday party",
];

/// Returns a blank-free version of `text`, or a random fallback prompt
/// if it was empty or whitespace only.
pub fn prompt_or_fallback<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback_prompt(rng).to_string()
    } else {
        trimmed.to_string()
    }
}

/// Picks a prompt from the fixed pool.
pub fn fallback_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FALLBACK_PROMPTS[rng.random_range(0..FALLBACK_PROMPTS.len())]
}
