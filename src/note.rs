use core::cmp::Ordering;
use core::fmt;

use crate::{Error, Signature, Tone};

#[doc = r#"
An immutable pitched note: a [`Tone`], a [`Signature`] duration and a
velocity in `[0.0, 1.0]`.

Notes order lexicographically on (tone, duration, velocity), so notes that
share a position in a [`Track`](crate::Track) iterate in a deterministic
order.

# Example
```rust
# use melodix::prelude::*;
let note = Note::from_tone(Tone::from_notation("A4")?);

assert_eq!(note.duration(), Signature::QUARTER);
assert_eq!(note.velocity(), 0.75);

let louder = note.with_velocity(1.0)?;
assert!(note < louder);
# Ok::<(), melodix::Error>(())
```
"#]
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    tone: Tone,
    duration: Signature,
    velocity: f64,
}

impl Note {
    /// The velocity given to notes created with [`Note::from_tone`].
    pub const DEFAULT_VELOCITY: f64 = 0.75;

    /// Create a new note.
    ///
    /// # Errors
    /// [`Error::InvalidVelocity`] if the velocity is outside `[0.0, 1.0]`.
    pub fn new(tone: Tone, duration: Signature, velocity: f64) -> Result<Self, Error> {
        if !(0.0..=1.0).contains(&velocity) {
            return Err(Error::InvalidVelocity(velocity));
        }
        Ok(Self {
            tone,
            duration,
            velocity,
        })
    }

    /// Create a note with the default duration of a quarter and the default
    /// velocity of 0.75.
    pub const fn from_tone(tone: Tone) -> Self {
        Self {
            tone,
            duration: Signature::QUARTER,
            velocity: Self::DEFAULT_VELOCITY,
        }
    }

    /// Returns the tone.
    pub const fn tone(&self) -> Tone {
        self.tone
    }

    /// Returns the duration.
    pub const fn duration(&self) -> Signature {
        self.duration
    }

    /// Returns the velocity.
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Returns a copy with the tone transposed by the given number of
    /// semitones.
    pub const fn transposed(&self, transposition: i32) -> Self {
        Self {
            tone: self.tone.transposed(transposition),
            duration: self.duration,
            velocity: self.velocity,
        }
    }

    /// Returns a copy with the given velocity.
    ///
    /// # Errors
    /// [`Error::InvalidVelocity`] if the velocity is outside `[0.0, 1.0]`.
    pub fn with_velocity(&self, velocity: f64) -> Result<Self, Error> {
        Self::new(self.tone, self.duration, velocity)
    }

    /// Returns a copy with the given duration.
    pub const fn with_duration(&self, duration: Signature) -> Self {
        Self {
            tone: self.tone,
            duration,
            velocity: self.velocity,
        }
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.tone == other.tone
            && self.duration == other.duration
            && self.velocity == other.velocity
    }
}

// Construction excludes NaN velocities, so equality is total.
impl Eq for Note {}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tone
            .cmp(&other.tone)
            .then_with(|| self.duration.cmp(&other.duration))
            .then_with(|| self.velocity.total_cmp(&other.velocity))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.3})",
            self.duration, self.tone, self.velocity
        )
    }
}

#[test]
fn validates_velocity() {
    let tone = Tone::new(57);
    assert!(Note::new(tone, Signature::QUARTER, 0.0).is_ok());
    assert!(Note::new(tone, Signature::QUARTER, 1.0).is_ok());
    assert!(matches!(
        Note::new(tone, Signature::QUARTER, 1.5),
        Err(Error::InvalidVelocity(_))
    ));
    assert!(Note::new(tone, Signature::QUARTER, -0.1).is_err());
    assert!(Note::new(tone, Signature::QUARTER, f64::NAN).is_err());
}

#[test]
fn defaults() {
    let note = Note::from_tone(Tone::new(0));
    assert_eq!(note.duration(), Signature::new(1, 4).unwrap());
    assert_eq!(note.velocity(), 0.75);
}

#[test]
fn field_replacement() {
    let note = Note::from_tone(Tone::from_notation("C4").unwrap());

    assert_eq!(note.transposed(2).tone(), Tone::from_notation("D4").unwrap());
    assert_eq!(note.with_velocity(0.5).unwrap().velocity(), 0.5);
    assert!(note.with_velocity(2.0).is_err());

    let half = Signature::new(1, 2).unwrap();
    assert_eq!(note.with_duration(half).duration(), half);
    // the original is untouched
    assert_eq!(note.duration(), Signature::QUARTER);
}

#[test]
fn equality_uses_common_denominators() {
    let a = Note::new(Tone::new(0), Signature::new(1, 2).unwrap(), 0.5).unwrap();
    let b = Note::new(Tone::new(0), Signature::new(2, 4).unwrap(), 0.5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn lexicographic_order() {
    let base = Note::new(Tone::new(10), Signature::QUARTER, 0.5).unwrap();

    assert!(base < base.transposed(1));
    assert!(base > base.transposed(-1));
    assert!(base < base.with_duration(Signature::new(1, 2).unwrap()));
    assert!(base < base.with_velocity(0.6).unwrap());

    // tone dominates duration, duration dominates velocity
    assert!(base.transposed(1) > base.with_duration(Signature::new(4, 4).unwrap()));
    assert!(base.with_duration(Signature::new(1, 2).unwrap()) > base.with_velocity(1.0).unwrap());
}

#[test]
fn display() {
    let note = Note::new(Tone::new(13), Signature::QUARTER, 0.75).unwrap();
    assert_eq!(note.to_string(), "1/4 C#1 (0.750)");
}
