//! Round-robin slot rotation: who works on which slot in which round, and
//! what they are shown.
//!
//! Players sit in a ring in join order. In round `r` player `p` works on
//! slot `(p - r) mod n`, so each round shifts everyone one slot back.
//! Over `n` rounds every slot passes through every player exactly once.
//!
//! ```text
//! n = 3     slot 0   slot 1   slot 2
//! round 0   A        B        C        (draw the prompt)
//! round 1   B        C        A        (caption the drawing)
//! round 2   C        A        B        (draw the caption)
//! ```
//!
//! Everything here is pure and depends only on the room size and the
//! stored data.

use sketchrelay_protocol::{Content, ContentKind, Expecting};

use crate::SubmissionStore;

/// Slot worked on by `player` in `round`. Panics if `n == 0`.
pub fn slot_index(player: usize, round: usize, n: usize) -> usize {
    (player as i64 - round as i64).rem_euclid(n as i64) as usize
}

/// Inverse of [`slot_index`]: the player working on `slot` in `round`.
pub fn player_for_slot(slot: usize, round: usize, n: usize) -> usize {
    (slot + round) % n
}

/// Even rounds draw, odd rounds write.
pub fn expecting(round: usize) -> Expecting {
    if round % 2 == 0 {
        Expecting::Draw
    } else {
        Expecting::Write
    }
}

/// How a submission made in `round` is displayed.
pub fn submission_kind(round: usize) -> ContentKind {
    match expecting(round) {
        Expecting::Draw => ContentKind::Image,
        Expecting::Write => ContentKind::Text,
    }
}

/// What the player assigned to `slot` is shown at the start of `round`:
/// the slot's prompt in round 0, otherwise the previous round's cell.
pub fn content_for<P: AsRef<str>>(
    round: usize,
    slot: usize,
    prompts: &[P],
    store: &SubmissionStore,
) -> Content {
    if round == 0 {
        return Content::prompt(prompts.get(slot).map_or("", |p| p.as_ref()));
    }
    let previous = round - 1;
    store
        .get(previous, slot)
        .map_or_else(Content::skipped, |cell| {
            cell.to_content(submission_kind(previous))
        })
}

/// One player's work order for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Index into the game-start roster.
    pub player: usize,
    pub slot: usize,
    pub expecting: Expecting,
    pub content: Content,
}

/// Work orders for every player of an `n = prompts.len()` game, in roster
/// order.
pub fn assignments<P: AsRef<str>>(
    round: usize,
    prompts: &[P],
    store: &SubmissionStore,
) -> Vec<Assignment> {
    let n = prompts.len();
    (0..n)
        .map(|player| {
            let slot = slot_index(player, round, n);
            Assignment {
                player,
                slot,
                expecting: expecting(round),
                content: content_for(round, slot, prompts, store),
            }
        })
        .collect()
}
