use melodix::io::Unsupported;
use melodix::prelude::*;

fn header(format: u16, tracks: u16, division: u16) -> Vec<u8> {
    let mut bytes = b"MThd\x00\x00\x00\x06".to_vec();
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&tracks.to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    bytes
}

fn empty_track_chunk() -> Vec<u8> {
    b"MTrk\x00\x00\x00\x04\x00\xFF\x2F\x00".to_vec()
}

#[test]
fn rejects_multi_track_files() {
    let mut bytes = header(0, 2, 96);
    bytes.extend_from_slice(&empty_track_chunk());

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ReadErrorKind::UnsupportedFormat(Unsupported::TrackCount(2))
    ));
}

#[test]
fn rejects_format_1_files() {
    let bytes = header(1, 1, 96);

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ReadErrorKind::UnsupportedFormat(Unsupported::Format(1))
    ));
}

#[test]
fn rejects_smpte_division() {
    // high bit set: -25 fps SMPTE timecode
    let bytes = header(0, 1, 0xE728);

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ReadErrorKind::UnsupportedFormat(Unsupported::SmpteDivision)
    ));
}

#[test]
fn rejects_second_track_chunk() {
    let mut bytes = header(0, 1, 96);
    bytes.extend_from_slice(&empty_track_chunk());
    bytes.extend_from_slice(&empty_track_chunk());

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err.kind(),
        ReadErrorKind::UnsupportedFormat(Unsupported::TrackCount(2))
    ));
}

#[test]
fn skips_unknown_chunks() {
    let mut bytes = b"XFIh\x00\x00\x00\x03\x01\x02\x03".to_vec();
    bytes.extend_from_slice(&header(0, 1, 96));
    bytes.extend_from_slice(&empty_track_chunk());

    let track = melodix::io::from_bytes(&bytes).unwrap();
    assert!(track.is_empty());
}

#[test]
fn fails_on_truncated_chunk_header() {
    let mut bytes = header(0, 1, 96);
    bytes.extend_from_slice(b"MTr");

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err.kind(), ReadErrorKind::UnexpectedEndOfData));
    assert_eq!(err.position(), 14);
}

#[test]
fn fails_on_event_stream_without_end_of_track() {
    let mut bytes = header(0, 1, 96);
    bytes.extend_from_slice(b"MTrk\x00\x00\x00\x04\x00\x90\x3C\x7F");

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err.kind(), ReadErrorKind::UnexpectedEndOfData));
}

#[test]
fn fails_on_truncated_var_len_delta() {
    let mut bytes = header(0, 1, 96);
    // continuation bit set on the last available byte
    bytes.extend_from_slice(b"MTrk\x00\x00\x00\x01\x81");

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err.kind(), ReadErrorKind::UnexpectedEndOfData));
}

#[test]
fn fails_on_unterminated_sysex() {
    let mut bytes = header(0, 1, 96);
    bytes.extend_from_slice(b"MTrk\x00\x00\x00\x04\x00\xF0\x43\x12");

    let err = melodix::io::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err.kind(), ReadErrorKind::UnexpectedEndOfData));
}

#[test]
fn writer_rejects_out_of_range_pitches() {
    let mut high = Track::new(Signature::COMMON_TIME);
    high.add(Note::new(Tone::from_notation("D11").unwrap(), Signature::QUARTER, 1.0).unwrap());

    let err = melodix::io::to_bytes(&mut high).unwrap_err();
    assert!(matches!(err, WriteError::UnrepresentablePitch(_)));

    let mut low = Track::new(Signature::COMMON_TIME);
    low.add(Note::new(Tone::from_notation("C-3").unwrap(), Signature::QUARTER, 1.0).unwrap());

    let err = melodix::io::to_bytes(&mut low).unwrap_err();
    assert!(matches!(err, WriteError::UnrepresentablePitch(_)));
}

#[test]
fn writer_rejects_wide_time_signatures() {
    let mut track = Track::new(Signature::new(512, 512).unwrap());

    let err = melodix::io::to_bytes(&mut track).unwrap_err();
    assert!(matches!(err, WriteError::UnrepresentableSignature(_)));
}
