#![doc = r#"
Reading and writing standard MIDI files.

# Overview

MIDI files are organized into chunks, each a 4-character ASCII id followed by
a 32-bit big-endian length and that many body bytes. The [`MidiWriter`]
emits a header chunk (`MThd`: format 0, one track, the tick resolution) and
a single track chunk (`MTrk`: delta-timed events ending with End of Track).
The [`MidiReader`] walks the same structure back into a
[`Track`](crate::Track).

For the common case of default settings there are two one-shot helpers:

```rust
# use melodix::prelude::*;
let mut track = Track::new(Signature::COMMON_TIME);
track.add(Note::new(Tone::from_notation("C4")?, Signature::QUARTER, 1.0)?);

let bytes = melodix::io::to_bytes(&mut track)?;
let restored = melodix::io::from_bytes(&bytes)?;

assert_eq!(restored, track);
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]

mod error;
pub use error::*;

mod reader;
pub use reader::*;

mod writer;
pub use writer::*;

use crate::Track;

/// Encode a track as a MIDI file with the default [`MidiWriter`]
/// configuration.
///
/// # Errors
/// See [`MidiWriter::to_bytes`].
pub fn to_bytes(track: &mut Track) -> Result<Vec<u8>, WriteError> {
    MidiWriter::new().to_bytes(track)
}

/// Decode a MIDI file into a merged track with the default [`MidiReader`]
/// configuration.
///
/// # Errors
/// See [`MidiReader::load`].
pub fn from_bytes(bytes: &[u8]) -> Result<Track, ReadError> {
    MidiReader::new().load(bytes)
}
