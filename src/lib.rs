#![doc = r#"
Musical track modeling with an exact-arithmetic standard MIDI file codec.

A [`Track`] is an ordered collection of [`Note`]s, each placed at an exact
fractional position. Positions, durations and time signatures are all
[`Signature`]s: fractions with power-of-two denominators that are compared
and added without ever touching floating point, so timing never drifts.

Tracks convert to and from single-track standard MIDI files through
[`MidiWriter`](io::MidiWriter) and [`MidiReader`](io::MidiReader).

# Example

```rust
use melodix::prelude::*;

let mut track = Track::new(Signature::new(3, 4)?);
track.add(Note::new(Tone::from_notation("C4")?, Signature::QUARTER, 1.0)?);
track.add(Note::new(Tone::from_notation("E4")?, Signature::QUARTER, 1.0)?);
track.add(Note::new(Tone::from_notation("G4")?, Signature::new(1, 2)?, 1.0)?);

let bytes = melodix::io::to_bytes(&mut track)?;
let restored = melodix::io::from_bytes(&bytes)?;

assert_eq!(restored, track);
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]
#![warn(missing_docs)]

mod error;
pub use error::*;

mod signature;
pub use signature::*;

mod tone;
pub use tone::*;

mod note;
pub use note::*;

mod track;
pub use track::*;

pub mod io;

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use crate::io::{MidiReader, MidiWriter, ReadError, ReadErrorKind, WriteError};
    pub use crate::{Error, Note, Signature, Tone, Track};
}
