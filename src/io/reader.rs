use std::collections::{BTreeMap, HashMap};

use crate::io::{ReadError, ReadErrorKind, Unsupported};
use crate::{Note, Signature, Tone, Track};

#[doc = r#"
Parses a single-track (format 0) standard MIDI file back into a [`Track`].

The parser understands Note On/Off (with running status and the
velocity-zero Note Off convention), the End of Track, Time Signature and
Channel Prefix meta events, and skips every other recognized event by its
known length. Note pairs are matched per channel and per pitch; a Note On
for an already sounding pitch and a Note Off for a silent pitch are both
ignored.

Reading is lossy but consistent: tempo and the exact pulse resolution are
not kept, while every position and duration is reconstructed as an exact
[`Signature`].

# Example
```rust
# use melodix::prelude::*;
let mut track = Track::new(Signature::COMMON_TIME);
track.add(Note::new(Tone::from_notation("A4")?, Signature::QUARTER, 1.0)?);

let bytes = MidiWriter::new().to_bytes(&mut track)?;
let restored = MidiReader::new().load(&bytes)?;

assert_eq!(restored, track);
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]
#[derive(Debug, Clone)]
pub struct MidiReader {
    middle_c: Tone,
}

impl Default for MidiReader {
    fn default() -> Self {
        Self {
            middle_c: Tone::new(36),
        }
    }
}

impl MidiReader {
    /// Create a reader with the default configuration (`C3` is middle C).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tone that MIDI pitch 60 maps back to.
    pub fn middle_c(mut self, middle_c: Tone) -> Self {
        self.middle_c = middle_c;
        self
    }

    /// Parse a MIDI file and merge the notes of every channel into a single
    /// track. The merged track's signature is the largest signature among
    /// all channels.
    ///
    /// # Errors
    /// Any [`ReadError`]; parsing is atomic and a malformed file yields no
    /// partial track.
    pub fn load(&self, bytes: &[u8]) -> Result<Track, ReadError> {
        Ok(self.parse(bytes)?.into_merged())
    }

    /// Parse a MIDI file and return the track of a single channel.
    ///
    /// # Errors
    /// [`ReadErrorKind::ChannelNotFound`] if no event addressed the channel,
    /// or any other [`ReadError`].
    pub fn load_channel(&self, bytes: &[u8], channel: u8) -> Result<Track, ReadError> {
        self.parse(bytes)?.channels.remove(&channel).ok_or_else(|| {
            ReadError::new(bytes.len(), ReadErrorKind::ChannelNotFound(channel))
        })
    }

    fn parse(&self, bytes: &[u8]) -> Result<ParsedFile, ReadError> {
        let mut cursor = ByteCursor::new(bytes);
        let mut ticks_per_quarter: Option<u16> = None;
        let mut state = DecodeState::default();
        let mut tracks_seen: u16 = 0;

        while !cursor.is_at_end() {
            let id: [u8; 4] = cursor.read_array()?;
            let length = cursor.read_u32()? as usize;
            let mut body = cursor.sub_cursor(length)?;

            match &id {
                b"MThd" => {
                    ticks_per_quarter = Some(parse_header(&mut body)?);
                }
                b"MTrk" => {
                    let Some(ticks_per_quarter) = ticks_per_quarter else {
                        return Err(ReadError::new(
                            body.position(),
                            ReadErrorKind::MissingHeader,
                        ));
                    };
                    tracks_seen += 1;
                    if tracks_seen > 1 {
                        return Err(ReadError::new(
                            body.position(),
                            Unsupported::TrackCount(tracks_seen).into(),
                        ));
                    }
                    self.decode_track(&mut body, ticks_per_quarter, &mut state)?;
                }
                // Chunks with any other id are ignored.
                _ => {}
            }
        }

        if ticks_per_quarter.is_none() {
            return Err(ReadError::new(
                cursor.position(),
                ReadErrorKind::MissingHeader,
            ));
        }

        Ok(state.finish())
    }

    /// Decode one track chunk's event stream until End of Track.
    fn decode_track(
        &self,
        cursor: &mut ByteCursor<'_>,
        ticks_per_quarter: u16,
        state: &mut DecodeState,
    ) -> Result<(), ReadError> {
        let mut running_status: Option<u8> = None;
        let mut time: u64 = 0;

        loop {
            let delta = read_var_len(cursor)?;
            time = time.checked_add(delta).ok_or_else(|| {
                ReadError::new(cursor.position(), ReadErrorKind::TimeOverflow)
            })?;

            let byte = cursor.read_u8()?;
            let status = if byte < 0x80 {
                // Running status: the previous status byte applies and this
                // byte is already the first data byte.
                let Some(previous) = running_status else {
                    return Err(ReadError::new(
                        cursor.position() - 1,
                        ReadErrorKind::UnknownStatus(byte),
                    ));
                };
                cursor.unread_byte();
                previous
            } else {
                running_status = Some(byte);
                byte
            };

            match status {
                0x80..=0x9F => {
                    let event_position = cursor.position();
                    let channel = status & 0x0F;
                    let data: [u8; 2] = cursor.read_array()?;
                    let [pitch, velocity] = data;

                    if status & 0xF0 == 0x90 && velocity > 0 {
                        state.note_on(channel, pitch, velocity, time);
                    } else {
                        state
                            .note_off(channel, pitch, time, ticks_per_quarter, self.middle_c)
                            .map_err(|kind| ReadError::new(event_position, kind))?;
                    }
                }
                // Polyphonic pressure, controller and pitch bend carry two
                // data bytes; program change and channel pressure carry one.
                0xA0..=0xBF | 0xE0..=0xEF => {
                    cursor.read(2)?;
                }
                0xC0..=0xDF => {
                    cursor.read(1)?;
                }
                0xF0 => {
                    // System exclusive: skip to the terminator.
                    while cursor.read_u8()? != 0xF7 {}
                }
                0xF1 | 0xF3 => {
                    cursor.read(1)?;
                }
                0xF2 => {
                    cursor.read(2)?;
                }
                0xF6 | 0xF8 | 0xFA | 0xFB | 0xFC | 0xFE => {}
                0xFF => {
                    if self.decode_meta(cursor, state)? {
                        return Ok(());
                    }
                }
                other => {
                    return Err(ReadError::new(
                        cursor.position() - 1,
                        ReadErrorKind::UnknownStatus(other),
                    ));
                }
            }
        }
    }

    /// Decode one meta event. Returns `true` on End of Track.
    fn decode_meta(
        &self,
        cursor: &mut ByteCursor<'_>,
        state: &mut DecodeState,
    ) -> Result<bool, ReadError> {
        let event_position = cursor.position();
        let meta = cursor.read_u8()?;
        let length = read_var_len(cursor)?;

        let expect_length = |expected: u64| {
            if length == expected {
                Ok(())
            } else {
                Err(ReadError::new(
                    event_position,
                    ReadErrorKind::InvalidMetaLength {
                        meta,
                        length: length as u32,
                    },
                ))
            }
        };

        match meta {
            // End of Track
            0x2F => {
                expect_length(0)?;
                Ok(true)
            }
            // Time Signature: nn dd cc bb, denominator is 2^dd
            0x58 => {
                expect_length(4)?;
                let body: [u8; 4] = cursor.read_array()?;
                let [nominator, exponent, _clocks, _thirty_seconds] = body;

                let denominator = 1u64.checked_shl(exponent as u32).ok_or_else(|| {
                    ReadError::new(
                        event_position,
                        crate::Error::InvalidSignature {
                            nominator: nominator as u64,
                            denominator: 0,
                        }
                        .into(),
                    )
                })?;
                state.set_signature(Signature::from_raw(nominator as u64, denominator));
                Ok(false)
            }
            // Channel Prefix: subsequent meta events bind to this channel
            0x20 => {
                expect_length(1)?;
                let prefix: [u8; 1] = cursor.read_array()?;
                state.channel_prefix = Some(prefix[0]);
                Ok(false)
            }
            _ => {
                cursor.read(length as usize)?;
                Ok(false)
            }
        }
    }
}

/// Parse an `MThd` body, returning the ticks-per-quarter-note division.
fn parse_header(cursor: &mut ByteCursor<'_>) -> Result<u16, ReadError> {
    let start = cursor.position();
    let format = cursor.read_u16()?;
    let track_count = cursor.read_u16()?;
    let division = cursor.read_u16()?;

    let unsupported = |issue: Unsupported| ReadError::new(start, issue.into());

    if format != 0 {
        return Err(unsupported(Unsupported::Format(format)));
    }
    if track_count != 1 {
        return Err(unsupported(Unsupported::TrackCount(track_count)));
    }
    if division & 0x8000 != 0 {
        return Err(unsupported(Unsupported::SmpteDivision));
    }
    if division == 0 {
        return Err(unsupported(Unsupported::ZeroDivision));
    }

    Ok(division)
}

/// Read a variable-length quantity: big-endian 7-bit groups, continuation
/// bit set on all but the last byte. Fails once the value no longer fits
/// 64 bits.
fn read_var_len(cursor: &mut ByteCursor<'_>) -> Result<u64, ReadError> {
    let mut value: u64 = 0;
    loop {
        let byte = cursor.read_u8()?;
        value = value
            .checked_mul(1 << 7)
            .ok_or_else(|| {
                ReadError::new(cursor.position() - 1, ReadErrorKind::TimeOverflow)
            })?
            | (byte & 0x7F) as u64;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Convert an absolute pulse count to an exact position, at a resolution of
/// 4096 subdivisions per quarter.
fn pulses_to_signature(pulses: u64, ticks_per_quarter: u16) -> Result<Signature, ReadErrorKind> {
    let subdivided = pulses
        .checked_mul(4096)
        .ok_or(ReadErrorKind::TimeOverflow)?;
    Ok(Signature::from_raw(subdivided / ticks_per_quarter as u64, 4 * 4096).normalized())
}

/// Per-channel decoding state plus the signature bucket for time signature
/// events seen outside any channel prefix.
#[derive(Default)]
struct DecodeState {
    channels: BTreeMap<u8, ChannelBucket>,
    default_signature: Option<Signature>,
    channel_prefix: Option<u8>,
}

#[derive(Default)]
struct ChannelBucket {
    /// Currently sounding pitches: pitch byte to (on time, on velocity).
    sounding: HashMap<u8, (u64, u8)>,
    notes: Vec<(Signature, Note)>,
    signature: Option<Signature>,
}

impl DecodeState {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8, time: u64) {
        let bucket = self.channels.entry(channel).or_default();
        // A Note On for an already sounding pitch does not retrigger.
        bucket.sounding.entry(pitch).or_insert((time, velocity));
    }

    fn note_off(
        &mut self,
        channel: u8,
        pitch: u8,
        time: u64,
        ticks_per_quarter: u16,
        middle_c: Tone,
    ) -> Result<(), ReadErrorKind> {
        let bucket = self.channels.entry(channel).or_default();
        // A Note Off for a pitch that is not sounding is ignored.
        let Some((on_time, velocity)) = bucket.sounding.remove(&pitch) else {
            return Ok(());
        };

        let position = pulses_to_signature(on_time, ticks_per_quarter)?;
        let duration = pulses_to_signature(time - on_time, ticks_per_quarter)?;
        let tone = Tone::new(pitch as i32 - (60 - middle_c.pitch()));
        let note = Note::new(tone, duration, velocity as f64 / 127.0)?;

        bucket.notes.push((position, note));
        Ok(())
    }

    fn set_signature(&mut self, signature: Signature) {
        match self.channel_prefix {
            Some(channel) => {
                self.channels.entry(channel).or_default().signature = Some(signature);
            }
            None => self.default_signature = Some(signature),
        }
    }

    fn finish(self) -> ParsedFile {
        let default_signature = self.default_signature;
        let channels = self
            .channels
            .into_iter()
            .map(|(channel, bucket)| {
                let signature = bucket
                    .signature
                    .or(default_signature)
                    .unwrap_or(Signature::COMMON_TIME);

                let mut track = Track::new(signature);
                for (position, note) in bucket.notes {
                    track.add_at(note, position);
                }
                (channel, track)
            })
            .collect();

        ParsedFile {
            channels,
            default_signature,
        }
    }
}

struct ParsedFile {
    channels: BTreeMap<u8, Track>,
    default_signature: Option<Signature>,
}

impl ParsedFile {
    fn into_merged(self) -> Track {
        let fallback = self.default_signature.unwrap_or(Signature::COMMON_TIME);
        let signature = self
            .channels
            .values()
            .map(Track::signature)
            .max()
            .unwrap_or(fallback);

        let mut merged = Track::new(signature);
        for (_, mut track) in self.channels {
            for (position, note) in track.iter() {
                merged.add_at(*note, *position);
            }
        }
        merged
    }
}

/// A bounded byte cursor that reports absolute file offsets and supports
/// the one-byte push-back running status needs.
struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            base: 0,
        }
    }

    /// The absolute offset of the next unread byte.
    fn position(&self) -> usize {
        self.base + self.position
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn read(&mut self, count: usize) -> Result<&'a [u8], ReadError> {
        let end = self.position.checked_add(count).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(ReadError::new(
                self.position(),
                ReadErrorKind::UnexpectedEndOfData,
            ));
        };
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let position = self.position();
        self.read(N)?
            .try_into()
            .map_err(|_| ReadError::new(position, ReadErrorKind::UnexpectedEndOfData))
    }

    fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Split off a bounded cursor over the next `count` bytes, keeping
    /// absolute positions intact.
    fn sub_cursor(&mut self, count: usize) -> Result<ByteCursor<'a>, ReadError> {
        let base = self.position();
        let bytes = self.read(count)?;
        Ok(ByteCursor {
            bytes,
            position: 0,
            base,
        })
    }

    /// Step back over the byte just read.
    fn unread_byte(&mut self) {
        self.position -= 1;
    }
}
