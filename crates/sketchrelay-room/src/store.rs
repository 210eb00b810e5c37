//! The round × slot grid of relay submissions.

use sketchrelay_protocol::{Content, ContentKind, PlayerId};

use crate::RoomError;

/// One cell of the grid: what a player produced for a slot in a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Opaque payload: an image string in draw rounds, a caption in
    /// write rounds.
    pub data: String,
    pub thumbnail: Option<String>,
    /// Who wrote the cell.
    pub source: PlayerId,
}

impl Submission {
    /// Converts the cell into displayable content of the given kind.
    pub fn to_content(&self, kind: ContentKind) -> Content {
        Content {
            kind,
            data: self.data.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }
}

/// Grid of `rounds × slots` optional submissions.
///
/// The store only bounds-checks; deciding who may write which cell is the
/// room's job.
#[derive(Debug, Clone, Default)]
pub struct SubmissionStore {
    slots: usize,
    grid: Vec<Vec<Option<Submission>>>,
}

impl SubmissionStore {
    /// Allocates an empty grid.
    pub fn new(rounds: usize, slots: usize) -> Self {
        Self {
            slots,
            grid: vec![vec![None; slots]; rounds],
        }
    }

    pub fn rounds(&self) -> usize {
        self.grid.len()
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Writes a cell, returning what it held before. Last write wins.
    pub fn set(
        &mut self,
        round: usize,
        slot: usize,
        submission: Submission,
    ) -> Result<Option<Submission>, RoomError> {
        let cell = self
            .grid
            .get_mut(round)
            .and_then(|row| row.get_mut(slot))
            .ok_or(RoomError::SlotOutOfRange { round, slot })?;
        Ok(cell.replace(submission))
    }

    /// Reads a cell. `None` for empty and out-of-range cells alike.
    pub fn get(&self, round: usize, slot: usize) -> Option<&Submission> {
        self.grid.get(round)?.get(slot)?.as_ref()
    }

    /// Number of filled cells in a round.
    pub fn filled(&self, round: usize) -> usize {
        self.grid
            .get(round)
            .map_or(0, |row| row.iter().filter(|c| c.is_some()).count())
    }

    /// `true` once every slot of `round` holds a submission. Always
    /// `false` for a round outside the grid.
    pub fn is_round_complete(&self, round: usize) -> bool {
        self.grid
            .get(round)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(data: &str, by: u64) -> Submission {
        Submission {
            data: data.into(),
            thumbnail: None,
            source: PlayerId(by),
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = SubmissionStore::new(3, 3);
        assert_eq!(store.rounds(), 3);
        assert_eq!(store.slots(), 3);
        for round in 0..3 {
            assert_eq!(store.filled(round), 0);
            assert!(!store.is_round_complete(round));
        }
    }

    #[test]
    fn test_round_completes_only_when_every_slot_filled() {
        let mut store = SubmissionStore::new(2, 3);
        store.set(0, 0, sub("a", 1)).unwrap();
        store.set(0, 2, sub("c", 3)).unwrap();
        assert_eq!(store.filled(0), 2);
        assert!(!store.is_round_complete(0));

        store.set(0, 1, sub("b", 2)).unwrap();
        assert!(store.is_round_complete(0));
        assert!(!store.is_round_complete(1), "next round is untouched");
    }

    #[test]
    fn test_set_overwrites_and_returns_previous() {
        let mut store = SubmissionStore::new(1, 2);
        assert_eq!(store.set(0, 1, sub("first", 1)).unwrap(), None);
        let previous = store.set(0, 1, sub("second", 1)).unwrap();
        assert_eq!(previous.map(|s| s.data), Some("first".to_string()));
        assert_eq!(store.get(0, 1).unwrap().data, "second");
        assert_eq!(store.filled(0), 1);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut store = SubmissionStore::new(2, 2);
        assert_eq!(
            store.set(2, 0, sub("x", 1)),
            Err(RoomError::SlotOutOfRange { round: 2, slot: 0 })
        );
        assert_eq!(
            store.set(0, 5, sub("x", 1)),
            Err(RoomError::SlotOutOfRange { round: 0, slot: 5 })
        );
        assert!(store.get(9, 9).is_none());
        assert!(!store.is_round_complete(9));
    }

    #[test]
    fn test_to_content_passes_thumbnail_through() {
        let cell = Submission {
            data: "img".into(),
            thumbnail: Some("small".into()),
            source: PlayerId(1),
        };
        let content = cell.to_content(ContentKind::Image);
        assert_eq!(content.kind, ContentKind::Image);
        assert_eq!(content.thumbnail.as_deref(), Some("small"));
    }
}
