use core::fmt;
use std::borrow::Cow;

use crate::{Note, Signature};

#[doc = r#"
An ordered collection of notes, each at an explicit position.

Several notes may share a position. Iteration yields `(position, note)`
pairs in ascending order of position, with ties broken by the note ordering.

Internally the track keeps an append-only list plus a dirty flag, sorting
lazily on the next iteration rather than on every insertion, so building a
track is cheap no matter how out of order the insertions arrive. Stored
positions are kept at a single common denominator (the largest ever
inserted); when a new position needs a larger one, every stored position is
rescaled once.

Notes are never removed; a track only grows.

# Example
```rust
# use melodix::prelude::*;
let mut track = Track::new(Signature::COMMON_TIME);

track.add(Note::from_tone(Tone::from_notation("C4")?));
track.add(Note::from_tone(Tone::from_notation("E4")?));

assert_eq!(track.length(), Signature::new(2, 4)?);
# Ok::<(), melodix::Error>(())
```
"#]
#[derive(Debug, Clone)]
pub struct Track {
    signature: Signature,
    max_denominator: u64,
    length: Signature,
    entries: Vec<(Signature, Note)>,
    sorted: bool,
}

impl Track {
    /// Create an empty track with the given time signature.
    pub const fn new(signature: Signature) -> Self {
        Self {
            signature,
            max_denominator: 1,
            length: Signature::ZERO,
            entries: Vec::new(),
            sorted: true,
        }
    }

    /// Create a track from `(note, position)` pairs. Notes with no position
    /// are appended at the end of the track as it stands when they are
    /// reached.
    pub fn with_content<I>(signature: Signature, content: I) -> Self
    where
        I: IntoIterator<Item = (Note, Option<Signature>)>,
    {
        let mut track = Self::new(signature);
        for (note, position) in content {
            match position {
                Some(position) => track.add_at(note, position),
                None => track.add(note),
            }
        }
        track
    }

    /// Returns the time signature of the track.
    pub const fn signature(&self) -> Signature {
        self.signature
    }

    /// Returns the length of the track: the position after which no note is
    /// still sounding. Maintained incrementally on every insertion.
    pub const fn length(&self) -> Signature {
        self.length
    }

    /// Returns the number of notes in the track.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the track holds no notes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a note at the current end of the track.
    pub fn add(&mut self, note: Note) {
        self.add_at(note, self.length);
    }

    /// Add a note at the given position.
    pub fn add_at(&mut self, note: Note, position: Signature) {
        if position.denominator() > self.max_denominator {
            self.max_denominator = position.denominator();
            for (stored, _) in &mut self.entries {
                *stored = stored.scaled_to(self.max_denominator);
            }
        }

        let position = position.scaled_to(self.max_denominator);

        self.entries.push((position, note));
        self.sorted = false;

        let end = position + note.duration();
        if end > self.length {
            self.length = end;
        }
    }

    /// Append several notes at the current end of the track. All of them are
    /// placed at the same position: the end of the track as it was when the
    /// call started.
    pub fn add_all<I>(&mut self, notes: I)
    where
        I: IntoIterator<Item = Note>,
    {
        self.add_all_at(notes, self.length);
    }

    /// Add several notes, all at the same position.
    pub fn add_all_at<I>(&mut self, notes: I, position: Signature)
    where
        I: IntoIterator<Item = Note>,
    {
        for note in notes {
            self.add_at(note, position);
        }
    }

    /// Iterate over `(position, note)` pairs in ascending order.
    ///
    /// Sorts the backing storage first if the track was mutated since the
    /// last iteration; repeated iteration without intervening mutation costs
    /// nothing beyond the traversal.
    pub fn iter(&mut self) -> core::slice::Iter<'_, (Signature, Note)> {
        if !self.sorted {
            self.entries.sort();
            self.sorted = true;
        }
        self.entries.iter()
    }

    fn sorted_entries(&self) -> Cow<'_, [(Signature, Note)]> {
        if self.sorted {
            Cow::Borrowed(&self.entries)
        } else {
            let mut entries = self.entries.clone();
            entries.sort();
            Cow::Owned(entries)
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature && self.sorted_entries() == other.sorted_entries()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track {} with {} notes",
            self.signature,
            self.entries.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tone;

    fn note(pitch: i32, duration: (u64, u64)) -> Note {
        Note::from_tone(Tone::new(pitch))
            .with_duration(Signature::new(duration.0, duration.1).unwrap())
    }

    fn sig(n: u64, d: u64) -> Signature {
        Signature::new(n, d).unwrap()
    }

    #[test]
    fn empty_track() {
        let mut track = Track::new(sig(3, 8));
        assert_eq!(track.signature(), sig(3, 8));
        assert_eq!(track.length(), Signature::ZERO);
        assert!(track.is_empty());
        assert_eq!(track.iter().next(), None);
    }

    #[test]
    fn length_tracks_rightmost_note_end() {
        let mut track = Track::new(Signature::COMMON_TIME);

        track.add(note(0, (10, 4)));
        assert_eq!(track.length(), sig(10, 4));

        track.add_at(note(0, (30, 8)), sig(40, 2));
        assert_eq!(track.length(), sig(190, 8));

        track.add(note(0, (1, 4)));
        assert_eq!(track.length(), sig(192, 8));
    }

    #[test]
    fn earlier_insertions_do_not_shrink_length() {
        let mut track = Track::new(Signature::COMMON_TIME);
        track.add_at(note(0, (1, 4)), sig(4, 1));
        track.add_at(note(0, (1, 4)), Signature::ZERO);
        assert_eq!(track.length(), sig(17, 4));
    }

    #[test]
    fn iterates_in_ascending_order() {
        let mut track = Track::new(Signature::COMMON_TIME);

        track.add(note(0, (1, 4)));
        track.add_all([note(0, (1, 4)), note(1, (1, 4)), note(-1, (1, 4))]);
        track.add_at(note(42, (8, 1)), sig(13, 1));

        let expected = vec![
            (sig(0, 1), note(0, (1, 4))),
            (sig(1, 4), note(-1, (1, 4))),
            (sig(1, 4), note(0, (1, 4))),
            (sig(1, 4), note(1, (1, 4))),
            (sig(13, 1), note(42, (8, 1))),
        ];

        let got: Vec<_> = track.iter().copied().collect();
        assert_eq!(got, expected);

        // restartable, and stable across repeated iteration
        let again: Vec<_> = track.iter().copied().collect();
        assert_eq!(again, expected);
    }

    #[test]
    fn batch_positions_resolve_before_insertion() {
        let mut track = Track::new(Signature::COMMON_TIME);
        track.add(note(0, (1, 4)));

        // all three land at 1/4, not one after another
        track.add_all([note(1, (1, 4)), note(2, (1, 4)), note(3, (1, 4))]);

        let positions: Vec<_> = track.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![sig(0, 1), sig(1, 4), sig(1, 4), sig(1, 4)]);
        assert_eq!(track.length(), sig(2, 4));
    }

    #[test]
    fn denominator_growth_rescales_existing_positions() {
        let mut track = Track::new(Signature::COMMON_TIME);
        track.add_at(note(0, (1, 4)), sig(1, 2));
        track.add_at(note(1, (1, 4)), sig(3, 16));

        let positions: Vec<_> = track.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions[0].denominator(), 16);
        assert_eq!(positions[1].denominator(), 16);
        assert_eq!(positions[0], sig(3, 16));
        assert_eq!(positions[1], sig(1, 2));
    }

    #[test]
    fn content_construction_matches_incremental_adds() {
        let from_content = Track::with_content(
            sig(17, 16),
            vec![
                (note(0, (3, 8)), Some(sig(7, 16))),
                (note(4, (1, 4)), None),
            ],
        );

        let mut incremental = Track::new(sig(17, 16));
        incremental.add_at(note(0, (3, 8)), sig(7, 16));
        incremental.add(note(4, (1, 4)));

        assert_eq!(from_content, incremental);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = Track::new(Signature::COMMON_TIME);
        a.add_at(note(0, (1, 4)), sig(1, 4));
        a.add_at(note(1, (1, 4)), Signature::ZERO);

        let mut b = Track::new(Signature::COMMON_TIME);
        b.add_at(note(1, (1, 4)), Signature::ZERO);
        b.add_at(note(0, (1, 4)), sig(1, 4));

        assert_eq!(a, b);

        let mut c = Track::new(sig(3, 4));
        c.add_at(note(1, (1, 4)), Signature::ZERO);
        c.add_at(note(0, (1, 4)), sig(1, 4));
        assert_ne!(a, c);
    }
}
