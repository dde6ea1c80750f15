use melodix::prelude::*;
use pretty_assertions::assert_eq;

fn sig(nominator: u64, denominator: u64) -> Signature {
    Signature::new(nominator, denominator).unwrap()
}

/// A note whose velocity is exactly representable in 7 bits, so it survives
/// the trip through a velocity byte.
fn note(pitch: i32, duration: (u64, u64), velocity_byte: u8) -> Note {
    Note::new(
        Tone::new(pitch),
        sig(duration.0, duration.1),
        velocity_byte as f64 / 127.0,
    )
    .unwrap()
}

#[test]
fn empty_track_round_trips() {
    let mut track = Track::new(sig(17, 16));

    let bytes = melodix::io::to_bytes(&mut track).unwrap();
    let restored = melodix::io::from_bytes(&bytes).unwrap();

    assert_eq!(restored, track);
    assert!(restored.is_empty());
}

#[test]
fn single_note_round_trips() {
    let mut track = Track::with_content(
        sig(17, 16),
        vec![(note(0, (3, 8), 127), Some(sig(7, 16)))],
    );

    let bytes = melodix::io::to_bytes(&mut track).unwrap();
    let restored = melodix::io::from_bytes(&bytes).unwrap();

    assert_eq!(restored, track);
}

#[test]
fn sequential_notes_round_trip() {
    let mut track = Track::new(sig(4, 4));

    // a walking line with mixed durations, including a zero-length note
    let pitches = [36, 40, 43, 48, 43, 40, 36, 31];
    for (step, pitch) in pitches.into_iter().enumerate() {
        let duration = ((step as u64 * 7) % 12, 16);
        track.add_at(note(pitch, duration, 127), sig(step as u64 * 200, 16));
    }

    let bytes = melodix::io::to_bytes(&mut track).unwrap();
    let restored = melodix::io::from_bytes(&bytes).unwrap();

    assert_eq!(restored, track);
}

#[test]
fn velocities_survive_when_seven_bit_representable() {
    let mut track = Track::new(sig(4, 4));
    // velocity zero is excluded: a Note On with velocity 0 is, by
    // convention, a Note Off on the wire
    for (index, velocity_byte) in [1u8, 2, 50, 63, 64, 100, 126, 127].into_iter().enumerate() {
        track.add_at(note(40 + index as i32, (1, 4), velocity_byte), sig(index as u64, 4));
    }

    let bytes = melodix::io::to_bytes(&mut track).unwrap();
    let restored = melodix::io::from_bytes(&bytes).unwrap();

    assert_eq!(restored, track);
}

#[test]
fn round_trip_with_custom_resolution_and_tempo() {
    let writer = MidiWriter::new()
        .pulses_per_quarter(480)
        .unwrap()
        .bpm(33.3)
        .unwrap();

    let mut track = Track::new(sig(3, 4));
    track.add(note(36, (1, 2), 127));
    track.add(note(38, (1, 16), 90));

    let bytes = writer.to_bytes(&mut track).unwrap();
    let restored = melodix::io::from_bytes(&bytes).unwrap();

    assert_eq!(restored, track);
}

#[test]
fn maximum_resolution_round_trips() {
    let writer = MidiWriter::new().pulses_per_quarter(0x7FFF).unwrap();

    let mut track = Track::new(sig(4, 4));
    track.add(note(36, (1, 4), 127));
    track.add(note(40, (1, 2), 100));

    let bytes = writer.to_bytes(&mut track).unwrap();
    // division high bit stays clear, so the output parses as tick timing
    assert_eq!(&bytes[12..14], &[0x7F, 0xFF]);

    let restored = melodix::io::from_bytes(&bytes).unwrap();
    assert_eq!(restored, track);
}

#[test]
fn channel_choice_survives() {
    let writer = MidiWriter::new().channel(9).unwrap();

    let mut track = Track::new(sig(4, 4));
    track.add(note(36, (1, 4), 127));

    let bytes = writer.to_bytes(&mut track).unwrap();

    let reader = MidiReader::new();
    let on_channel = reader.load_channel(&bytes, 9).unwrap();
    assert_eq!(on_channel.len(), 1);

    let missing = reader.load_channel(&bytes, 0).unwrap_err();
    assert!(matches!(missing.kind(), ReadErrorKind::ChannelNotFound(0)));
}

#[test]
fn custom_middle_c_round_trips_when_matched() {
    let middle_c = Tone::from_notation("C4").unwrap();
    let writer = MidiWriter::new().middle_c(middle_c);
    let reader = MidiReader::new().middle_c(middle_c);

    let mut track = Track::new(sig(4, 4));
    track.add(note(0, (1, 4), 127));

    let bytes = writer.to_bytes(&mut track).unwrap();
    let restored = reader.load(&bytes).unwrap();

    assert_eq!(restored, track);
}

#[test]
fn merges_channels_with_their_signatures() {
    // Hand-built format 0 file with notes on channels 0 and 1 and a
    // per-channel time signature bound through channel prefix events.
    let track_body: Vec<u8> = [
        &[0x00, 0xFF, 0x20, 0x01, 0x00][..], // prefix channel 0
        &[0x00, 0xFF, 0x58, 0x04, 0x03, 0x02, 0x18, 0x08], // 3/4
        &[0x00, 0xFF, 0x20, 0x01, 0x01], // prefix channel 1
        &[0x00, 0xFF, 0x58, 0x04, 0x05, 0x02, 0x18, 0x08], // 5/4
        &[0x00, 0x90, 0x3C, 0x7F],
        &[0x00, 0x91, 0x3E, 0x7F],
        &[0x60, 0x80, 0x3C, 0x40],
        &[0x00, 0x81, 0x3E, 0x40],
        &[0x00, 0xFF, 0x2F, 0x00],
    ]
    .concat();

    let mut bytes = b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x00\x60".to_vec();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track_body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&track_body);

    let reader = MidiReader::new();

    let channel_0 = reader.load_channel(&bytes, 0).unwrap();
    assert_eq!(channel_0.signature(), sig(3, 4));
    assert_eq!(channel_0.len(), 1);

    let channel_1 = reader.load_channel(&bytes, 1).unwrap();
    assert_eq!(channel_1.signature(), sig(5, 4));

    let merged = reader.load(&bytes).unwrap();
    let expected = Track::with_content(
        sig(5, 4),
        vec![
            (note(36, (1, 4), 127), Some(sig(0, 1))),
            (note(38, (1, 4), 127), Some(sig(0, 1))),
        ],
    );
    assert_eq!(merged, expected);
}
