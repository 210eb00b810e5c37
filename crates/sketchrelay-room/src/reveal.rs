//! Reveal assembly: one chain per slot, prompt first, then every round's
//! cell for that slot.

use sketchrelay_protocol::{Chain, ChainOwner, Content};

use crate::SubmissionStore;
use crate::rotation::submission_kind;

/// Builds every chain of a finished game.
///
/// `owners[s]` names whoever held slot `s` at game start and `prompts[s]`
/// is that slot's prompt. Each chain has `store.rounds() + 1` items; cells
/// nobody filled show up as [`Content::skipped`].
pub fn build_chains<O, P>(
    owners: &[O],
    prompts: &[P],
    store: &SubmissionStore,
) -> Vec<Chain>
where
    O: AsRef<str>,
    P: AsRef<str>,
{
    (0..prompts.len())
        .map(|slot| {
            let mut chain = Vec::with_capacity(store.rounds() + 1);
            chain.push(Content::prompt(prompts[slot].as_ref()));
            chain.extend((0..store.rounds()).map(|round| {
                store.get(round, slot).map_or_else(Content::skipped, |cell| {
                    cell.to_content(submission_kind(round))
                })
            }));
            Chain {
                slot,
                owner: ChainOwner {
                    name: owners.get(slot).map(|o| o.as_ref().to_string()).unwrap_or_default(),
                },
                chain,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use sketchrelay_protocol::{ContentKind, PlayerId};

    use super::*;
    use crate::Submission;
    use crate::rotation::player_for_slot;

    fn fill_game(prompts: &[&str]) -> SubmissionStore {
        let n = prompts.len();
        let mut store = SubmissionStore::new(n, n);
        for round in 0..n {
            for slot in 0..n {
                let worker = player_for_slot(slot, round, n);
                store
                    .set(
                        round,
                        slot,
                        Submission {
                            data: format!("r{round}s{slot}p{worker}"),
                            thumbnail: None,
                            source: PlayerId(worker as u64),
                        },
                    )
                    .unwrap();
            }
        }
        store
    }

    #[test]
    fn test_every_chain_has_n_plus_one_items() {
        let prompts = ["cat", "tree", "car", "boat"];
        let store = fill_game(&prompts);
        let chains = build_chains(&["A", "B", "C", "D"], &prompts, &store);

        assert_eq!(chains.len(), 4);
        for (slot, chain) in chains.iter().enumerate() {
            assert_eq!(chain.slot, slot);
            assert_eq!(chain.chain.len(), 5);
            assert_eq!(chain.chain[0], Content::prompt(prompts[slot]));
        }
    }

    #[test]
    fn test_chain_alternates_image_and_text() {
        let prompts = ["cat", "tree", "car"];
        let store = fill_game(&prompts);
        let chains = build_chains(&["A", "B", "C"], &prompts, &store);

        let kinds: Vec<ContentKind> =
            chains[0].chain.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContentKind::Prompt,
                ContentKind::Image,
                ContentKind::Text,
                ContentKind::Image
            ]
        );
    }

    #[test]
    fn test_chain_follows_the_slot_through_each_player() {
        let prompts = ["cat", "tree", "car"];
        let store = fill_game(&prompts);
        let chains = build_chains(&["A", "B", "C"], &prompts, &store);

        // Slot 0: A draws, B captions, C draws.
        let data: Vec<&str> =
            chains[0].chain.iter().map(|c| c.data.as_str()).collect();
        assert_eq!(data, vec!["cat", "r0s0p0", "r1s0p1", "r2s0p2"]);
        assert_eq!(chains[0].owner.name, "A");
    }

    #[test]
    fn test_unfilled_cells_are_skipped() {
        let prompts = ["cat", "tree"];
        let store = SubmissionStore::new(2, 2);
        let chains = build_chains(&["A", "B"], &prompts, &store);
        assert_eq!(chains[1].chain[1], Content::skipped());
        assert_eq!(chains[1].chain[2], Content::skipped());
    }
}
