use core::fmt;

use crate::Error;

#[doc = r#"
A pitch on the chromatic scale.

The pitch index counts semitones from C0: pitch `0` is `C0`, `12` is `C1`
and `57` is `A4`. Negative pitches are valid and denote octaves below zero.

# Example
```rust
# use melodix::prelude::*;
let tone = Tone::from_notation("A4")?;

assert_eq!(tone.pitch(), 57);
assert_eq!(tone.frequency(), 440.0);
assert_eq!(tone.transposed(12).to_notation(), "A5");
# Ok::<(), melodix::Error>(())
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tone {
    pitch: i32,
}

impl Tone {
    /// Create a tone from a chromatic pitch index.
    pub const fn new(pitch: i32) -> Self {
        Self { pitch }
    }

    /// Parse a tone from notation such as `C`, `F#3`, `Db-1` or `G#b#5`.
    ///
    /// The tone letter must be uppercase. Any number of stacked `#` and `b`
    /// modifiers is allowed; they transpose by one semitone each and their
    /// effects sum. The octave suffix may be negative and defaults to 0 when
    /// omitted.
    ///
    /// # Errors
    /// [`Error::InvalidNotation`] if the string does not match
    /// `[A-G][#b]*(-?digits)?`.
    pub fn from_notation(notation: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidNotation(notation.to_owned());

        let mut chars = notation.chars();
        let base = match chars.next().ok_or_else(invalid)? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let accidentals_end = rest
            .find(|c| c != '#' && c != 'b')
            .unwrap_or(rest.len());
        let (accidentals, octave) = rest.split_at(accidentals_end);

        let transposition: i32 = accidentals
            .chars()
            .map(|c| if c == '#' { 1 } else { -1 })
            .sum();

        let octave: i32 = if octave.is_empty() {
            0
        } else {
            octave.parse().map_err(|_| invalid())?
        };

        Ok(Self {
            pitch: 12 * octave + base + transposition,
        })
    }

    /// Returns the chromatic pitch index.
    pub const fn pitch(&self) -> i32 {
        self.pitch
    }

    /// Returns the octave of the tone. Octaves below `C0` are negative.
    pub const fn octave(&self) -> i32 {
        self.pitch.div_euclid(12)
    }

    /// Format the tone as notation, spelling altered pitches with a sharp
    /// relative to the natural tone one semitone below.
    ///
    /// # Example
    /// ```rust
    /// # use melodix::prelude::*;
    /// assert_eq!(Tone::new(13).to_notation(), "C#1");
    /// assert_eq!(Tone::new(-1).to_notation(), "B-1");
    /// ```
    pub fn to_notation(&self) -> String {
        self.notation(false)
    }

    /// Format the tone as notation, spelling altered pitches with a flat
    /// relative to the natural tone one semitone above.
    ///
    /// # Example
    /// ```rust
    /// # use melodix::prelude::*;
    /// assert_eq!(Tone::new(13).to_flat_notation(), "Db1");
    /// assert_eq!(Tone::new(113).to_flat_notation(), "F9");
    /// ```
    pub fn to_flat_notation(&self) -> String {
        self.notation(true)
    }

    fn notation(&self, transpose_down: bool) -> String {
        let octave = self.pitch.div_euclid(12);
        let spelling = match (self.pitch.rem_euclid(12), transpose_down) {
            (0, _) => "C",
            (2, _) => "D",
            (4, _) => "E",
            (5, _) => "F",
            (7, _) => "G",
            (9, _) => "A",
            (11, _) => "B",
            (1, false) => "C#",
            (1, true) => "Db",
            (3, false) => "D#",
            (3, true) => "Eb",
            (6, false) => "F#",
            (6, true) => "Gb",
            (8, false) => "G#",
            (8, true) => "Ab",
            (10, false) => "A#",
            (10, true) => "Bb",
            _ => unreachable!(),
        };

        format!("{spelling}{octave}")
    }

    /// Returns the frequency of the tone in Hz given the frequency of `A4`.
    pub fn to_frequency(&self, base: f64) -> f64 {
        base * 2f64.powf((self.pitch - 57) as f64 / 12.0)
    }

    /// Returns the frequency of the tone in Hz with `A4` at 440 Hz.
    pub fn frequency(&self) -> f64 {
        self.to_frequency(440.0)
    }

    /// Returns a copy transposed by the given number of semitones.
    pub const fn transposed(&self, transposition: i32) -> Self {
        Self {
            pitch: self.pitch + transposition,
        }
    }
}

impl From<i32> for Tone {
    fn from(pitch: i32) -> Self {
        Self::new(pitch)
    }
}

impl TryFrom<&str> for Tone {
    type Error = Error;

    fn try_from(notation: &str) -> Result<Self, Error> {
        Self::from_notation(notation)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_notation())
    }
}

#[test]
fn parses_notation() {
    assert_eq!(Tone::from_notation("C").unwrap().pitch(), 0);
    assert_eq!(Tone::from_notation("A4").unwrap().pitch(), 57);
    assert_eq!(Tone::from_notation("Db3").unwrap().pitch(), 37);
    assert_eq!(Tone::from_notation("G#5").unwrap().pitch(), 68);
    assert_eq!(Tone::from_notation("G#b#bb#5").unwrap().pitch(), 67);
    assert_eq!(Tone::from_notation("F-2").unwrap().pitch(), -19);

    assert_eq!(Tone::try_from("A4").unwrap(), Tone::new(57));
    assert_eq!(Tone::from(57), Tone::new(57));
}

#[test]
fn rejects_bad_notation() {
    for bad in ["", "H", "c4", "C4x", "#", "C#-", "Cb4b"] {
        assert!(
            matches!(Tone::from_notation(bad), Err(Error::InvalidNotation(_))),
            "{bad:?} should not parse"
        );
    }
}

#[test]
fn formats_notation() {
    assert_eq!(Tone::new(0).to_notation(), "C0");
    assert_eq!(Tone::new(1).to_notation(), "C#0");
    assert_eq!(Tone::new(13).to_notation(), "C#1");
    assert_eq!(Tone::new(13).to_flat_notation(), "Db1");
    assert_eq!(Tone::new(113).to_notation(), "F9");
    assert_eq!(Tone::new(113).to_flat_notation(), "F9");
}

#[test]
fn notation_round_trips() {
    for pitch in -36..=120 {
        let tone = Tone::new(pitch);
        assert_eq!(Tone::from_notation(&tone.to_notation()).unwrap(), tone);
        assert_eq!(Tone::from_notation(&tone.to_flat_notation()).unwrap(), tone);
    }
}

#[test]
fn octaves() {
    assert_eq!(Tone::from_notation("C5").unwrap().octave(), 5);
    assert_eq!(Tone::from_notation("F-2").unwrap().octave(), -2);
    assert_eq!(Tone::new(-1).octave(), -1);
}

#[test]
fn frequencies_double_per_octave() {
    assert_eq!(Tone::new(57).frequency(), 440.0);
    assert_eq!(Tone::new(69).frequency(), 880.0);
    assert_eq!(Tone::new(45).frequency(), 220.0);
    assert_eq!(Tone::new(57).to_frequency(432.0), 432.0);
}

#[test]
fn transposition() {
    let c4 = Tone::from_notation("C4").unwrap();
    assert_eq!(c4.transposed(1).to_notation(), "C#4");
    assert_eq!(c4.transposed(2).to_notation(), "D4");
    assert_eq!(c4.transposed(-1).to_notation(), "B3");
    assert_eq!(c4.transposed(-2).to_notation(), "A#3");
}
