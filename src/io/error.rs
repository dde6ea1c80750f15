use thiserror::Error;

use crate::{Signature, Tone};

#[doc = r#"
An error raised while parsing a MIDI file, tagged with the byte offset at
which parsing failed.

Parsing is atomic: on error no partial track is produced.
"#]
#[derive(Debug, Error)]
#[error("read failed at byte {position}: {kind}")]
pub struct ReadError {
    position: usize,
    kind: ReadErrorKind,
}

impl ReadError {
    pub(crate) const fn new(position: usize, kind: ReadErrorKind) -> Self {
        Self { position, kind }
    }

    /// Returns the byte offset at which the error occurred.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns what went wrong.
    pub const fn kind(&self) -> &ReadErrorKind {
        &self.kind
    }
}

/// The kinds of failure [`ReadError`] can carry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadErrorKind {
    /// The file or a chunk ended before its declared length.
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    /// The file uses a feature outside the supported single-track subset.
    #[error("unsupported file: {0}")]
    UnsupportedFormat(#[from] Unsupported),
    /// A status byte with no known event length.
    #[error("unknown status byte {0:#04x}")]
    UnknownStatus(u8),
    /// A meta event whose length field does not match its fixed size.
    #[error("meta event {meta:#04x} has invalid length {length}")]
    InvalidMetaLength {
        /// The meta event type byte.
        meta: u8,
        /// The declared length.
        length: u32,
    },
    /// No header chunk appeared before a track chunk or the end of the
    /// file.
    #[error("missing header chunk")]
    MissingHeader,
    /// An accumulated delta time or pulse count too large to represent.
    #[error("delta time overflowed")]
    TimeOverflow,
    /// The requested channel holds no events.
    #[error("channel {0} not found")]
    ChannelNotFound(u8),
    /// A value decoded from the file failed validation.
    #[error(transparent)]
    Value(#[from] crate::Error),
}

/// Valid MIDI constructs this reader deliberately does not handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// A format other than 0.
    #[error("midi format {0} (only format 0 is supported)")]
    Format(u16),
    /// More than one track chunk declared.
    #[error("{0} tracks (only single-track files are supported)")]
    TrackCount(u16),
    /// SMPTE timecode division in the header.
    #[error("SMPTE timecode division")]
    SmpteDivision,
    /// A division of zero ticks per quarter note.
    #[error("zero ticks per quarter note")]
    ZeroDivision,
}

#[doc = r#"
An error raised while encoding a track to a MIDI file.
"#]
#[derive(Debug, Error)]
pub enum WriteError {
    /// A tone that falls outside the MIDI pitch range [0, 127] after the
    /// middle C offset is applied.
    #[error("tone {0} is outside the midi pitch range")]
    UnrepresentablePitch(Tone),
    /// A time signature whose nominator does not fit the meta event's
    /// single nominator byte.
    #[error("time signature {0} cannot be encoded in a midi meta event")]
    UnrepresentableSignature(Signature),
    /// A pulses-per-quarter-note resolution of zero, or one that does not
    /// fit the 15 bits the header's division field allows.
    #[error("invalid pulses per quarter note (must be in 1..=32767)")]
    InvalidPulsesPerQuarter,
    /// A channel outside [0, 15].
    #[error("invalid channel {0} (must be in 0..=15)")]
    InvalidChannel(u8),
    /// A tempo that is not a positive finite number.
    #[error("invalid tempo {0} (beats per minute must be positive and finite)")]
    InvalidTempo(f64),
    /// The underlying writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
