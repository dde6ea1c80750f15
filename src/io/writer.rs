use std::io::Write;

use crate::io::WriteError;
use crate::{Note, Signature, Tone, Track};

/// MIDI clocks per metronome click, written into the time signature meta
/// event.
const CLOCKS_PER_CLICK: u8 = 24;

/// Thirty-second notes per quarter, written into the time signature meta
/// event.
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;

/// Release velocity for every Note Off event.
const RELEASE_VELOCITY: u8 = 64;

#[doc = r#"
Encodes a [`Track`] as a single-track (format 0) standard MIDI file.

Every configuration knob has a sensible default: 96 pulses per quarter note,
120 beats per minute, channel 0, and `C3` mapped to MIDI's middle C
(value 60).

# Example
```rust
# use melodix::prelude::*;
let mut track = Track::new(Signature::COMMON_TIME);
track.add(Note::from_tone(Tone::from_notation("A4")?));

let bytes = MidiWriter::new().channel(3)?.to_bytes(&mut track)?;
assert_eq!(&bytes[..4], b"MThd");
# Ok::<(), Box<dyn std::error::Error>>(())
```
"#]
#[derive(Debug, Clone)]
pub struct MidiWriter {
    pulses_per_quarter: u16,
    middle_c: Tone,
    bpm: f64,
    channel: u8,
}

impl Default for MidiWriter {
    fn default() -> Self {
        Self {
            pulses_per_quarter: 96,
            middle_c: Tone::new(36),
            bpm: 120.0,
            channel: 0,
        }
    }
}

impl MidiWriter {
    /// Create a writer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution in pulses per quarter note.
    ///
    /// The header's division field keeps its high bit free to mark SMPTE
    /// timecode, so the resolution is limited to 15 bits.
    ///
    /// # Errors
    /// [`WriteError::InvalidPulsesPerQuarter`] for zero or for values above
    /// `0x7FFF`.
    pub fn pulses_per_quarter(mut self, pulses_per_quarter: u16) -> Result<Self, WriteError> {
        if pulses_per_quarter == 0 || pulses_per_quarter > 0x7FFF {
            return Err(WriteError::InvalidPulsesPerQuarter);
        }
        self.pulses_per_quarter = pulses_per_quarter;
        Ok(self)
    }

    /// Set the tone written as MIDI pitch 60. Every written pitch is offset
    /// by `60 - middle_c.pitch()`.
    pub fn middle_c(mut self, middle_c: Tone) -> Self {
        self.middle_c = middle_c;
        self
    }

    /// Set the tempo in beats per minute.
    ///
    /// # Errors
    /// [`WriteError::InvalidTempo`] unless positive and finite.
    pub fn bpm(mut self, bpm: f64) -> Result<Self, WriteError> {
        if !(bpm > 0.0 && bpm.is_finite()) {
            return Err(WriteError::InvalidTempo(bpm));
        }
        self.bpm = bpm;
        Ok(self)
    }

    /// Set the channel all note events are written on.
    ///
    /// # Errors
    /// [`WriteError::InvalidChannel`] outside `0..=15`.
    pub fn channel(mut self, channel: u8) -> Result<Self, WriteError> {
        if channel > 15 {
            return Err(WriteError::InvalidChannel(channel));
        }
        self.channel = channel;
        Ok(self)
    }

    /// Encode the track and write the bytes out.
    ///
    /// The track is mutably borrowed because iteration sorts it in place.
    ///
    /// # Errors
    /// [`WriteError::UnrepresentablePitch`] if any offset pitch falls outside
    /// [0, 127], [`WriteError::UnrepresentableSignature`] if the track
    /// signature's nominator does not fit a byte, or any I/O failure from the
    /// underlying writer.
    pub fn write<W: Write>(&self, track: &mut Track, mut writer: W) -> Result<(), WriteError> {
        let bytes = self.to_bytes(track)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Encode the track into an in-memory byte buffer.
    pub fn to_bytes(&self, track: &mut Track) -> Result<Vec<u8>, WriteError> {
        let mut events: Vec<(u64, [u8; 3])> = Vec::with_capacity(track.len() * 2);
        for (position, note) in track.iter() {
            let on_time = self.pulses(*position);
            let off_time = on_time + self.pulses(note.duration());
            events.push((on_time, self.note_on(note)?));
            events.push((off_time, self.note_off(note)?));
        }
        // Stable by key: a note's On stays ahead of its Off when simultaneous
        // with other events.
        events.sort_by_key(|(time, _)| *time);

        let mut body = Vec::new();
        push_var_len(&mut body, 0);
        body.extend_from_slice(&self.time_signature_event(track.signature())?);
        push_var_len(&mut body, 0);
        body.extend_from_slice(&self.tempo_event());

        let mut last_time = 0;
        for (time, event) in events {
            push_var_len(&mut body, time - last_time);
            body.extend_from_slice(&event);
            last_time = time;
        }

        push_var_len(&mut body, 0);
        body.extend_from_slice(&[0xFF, 0x2F, 0x00]);

        let mut out = Vec::with_capacity(14 + 8 + body.len());
        push_chunk(&mut out, *b"MThd", &self.header_body());
        push_chunk(&mut out, *b"MTrk", &body);
        Ok(out)
    }

    fn header_body(&self) -> [u8; 6] {
        let [division_high, division_low] = self.pulses_per_quarter.to_be_bytes();
        // format 0, one track
        [0x00, 0x00, 0x00, 0x01, division_high, division_low]
    }

    /// Whole pulses in a signature; sub-resolution remainders floor to zero.
    fn pulses(&self, signature: Signature) -> u64 {
        let normalized = signature.normalized();
        let pulses_per_whole = self.pulses_per_quarter as u64 * 4;
        pulses_per_whole / normalized.denominator() * normalized.nominator()
    }

    fn midi_pitch(&self, tone: Tone) -> Result<u8, WriteError> {
        let delta = 60 - self.middle_c.pitch();
        u8::try_from(tone.pitch() + delta)
            .ok()
            .filter(|pitch| *pitch <= 127)
            .ok_or(WriteError::UnrepresentablePitch(tone))
    }

    fn note_on(&self, note: &Note) -> Result<[u8; 3], WriteError> {
        let pitch = self.midi_pitch(note.tone())?;
        let velocity = ((note.velocity() * 127.0).round() as u8).min(127);
        Ok([0x90 | self.channel, pitch, velocity])
    }

    fn note_off(&self, note: &Note) -> Result<[u8; 3], WriteError> {
        let pitch = self.midi_pitch(note.tone())?;
        Ok([0x80 | self.channel, pitch, RELEASE_VELOCITY])
    }

    fn time_signature_event(&self, signature: Signature) -> Result<[u8; 7], WriteError> {
        let nominator = u8::try_from(signature.nominator())
            .map_err(|_| WriteError::UnrepresentableSignature(signature))?;
        let denominator_exponent = signature.denominator().trailing_zeros() as u8;

        Ok([
            0xFF,
            0x58,
            0x04,
            nominator,
            denominator_exponent,
            CLOCKS_PER_CLICK,
            THIRTY_SECONDS_PER_QUARTER,
        ])
    }

    fn tempo_event(&self) -> [u8; 6] {
        let micros_per_quarter = (60_000_000.0 / self.bpm).round() as u32;
        let [_, b0, b1, b2] = micros_per_quarter.to_be_bytes();
        [0xFF, 0x51, 0x03, b0, b1, b2]
    }
}

/// Append a variable-length quantity: big-endian 7-bit groups with the
/// continuation bit set on all but the last byte.
fn push_var_len(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    loop {
        groups[count] = (value & 0x7F) as u8;
        value >>= 7;
        count += 1;
        if value == 0 {
            break;
        }
    }

    while count > 1 {
        count -= 1;
        out.push(groups[count] | 0x80);
    }
    out.push(groups[0]);
}

/// Append a chunk: 4-byte ASCII id, 4-byte big-endian length, body.
fn push_chunk(out: &mut Vec<u8>, id: [u8; 4], body: &[u8]) {
    out.extend_from_slice(&id);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
}
