//! Wire framing: header layout, checksum and frame encoding.
//!
//! ```text
//! offset  0   1   2   3   4   5   6 .. 6+len   6+len  7+len
//!        B5  62  FF  01  len(LE)  payload       CK_A   CK_B
//! ```
//!
//! The checksum covers everything from the class byte through the end of the
//! payload. It never covers the sync bytes or itself.

/// Sync bytes at the start of every frame.
pub const SYNC: [u8; 2] = [0xB5, 0x62];

/// Message class and id of the RaceBox data message.
pub const CLASS_ID: [u8; 2] = [0xFF, 0x01];

/// Bytes preceding the payload: sync, class/id and the length field.
pub const HEADER_LEN: usize = 6;

/// Trailing checksum bytes.
pub const CHECKSUM_LEN: usize = 2;

/// Smallest chunk that can carry a frame (empty payload).
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CHECKSUM_LEN;

/// Payload size of a complete data message.
pub const FULL_PAYLOAD_LEN: usize = 80;

/// Running sum-of-sums checksum over `bytes`.
///
/// Returns `(ck_a, ck_b)`.
pub fn checksum(bytes: &[u8]) -> (u8, u8) {
    bytes.iter().fold((0u8, 0u8), |(a, b), &byte| {
        let a = a.wrapping_add(byte);
        (a, b.wrapping_add(a))
    })
}

/// Check the trailing checksum of a chunk.
///
/// The last two bytes of the chunk are the checksum, whatever the declared
/// payload length says. Chunks shorter than [`MIN_FRAME_LEN`] never verify.
pub fn verify_checksum(chunk: &[u8]) -> bool {
    if chunk.len() < MIN_FRAME_LEN {
        return false;
    }
    let (body, trailer) = chunk.split_at(chunk.len() - CHECKSUM_LEN);
    let (ck_a, ck_b) = checksum(&body[SYNC.len()..]);
    trailer[0] == ck_a && trailer[1] == ck_b
}

/// Sync bytes and class/id match the data message.
pub fn has_valid_start(chunk: &[u8]) -> bool {
    chunk.len() >= 4 && chunk[0..2] == SYNC && chunk[2..4] == CLASS_ID
}

/// Declared payload length (offset 4, little-endian).
pub fn declared_length(chunk: &[u8]) -> Option<usize> {
    let bytes = chunk.get(4..HEADER_LEN)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]) as usize)
}

/// Payload slice of a chunk according to its declared length.
///
/// `None` when the chunk is too short to hold the declared payload plus the
/// checksum trailer.
pub fn payload_slice(chunk: &[u8]) -> Option<&[u8]> {
    let len = declared_length(chunk)?;
    let end = HEADER_LEN + len;
    if end + CHECKSUM_LEN > chunk.len() {
        return None;
    }
    Some(&chunk[HEADER_LEN..end])
}

/// Wrap `payload` in sync bytes, class/id, length and checksum.
///
/// # Panics
///
/// Panics if the payload is longer than `u16::MAX` bytes.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let len = u16::try_from(payload.len()).expect("payload length exceeds u16::MAX");

    let mut frame = Vec::with_capacity(MIN_FRAME_LEN + payload.len());
    frame.extend_from_slice(&SYNC);
    frame.extend_from_slice(&CLASS_ID);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);

    let (ck_a, ck_b) = checksum(&frame[SYNC.len()..]);
    frame.push(ck_a);
    frame.push(ck_b);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn checksum_matches_hand_computation() {
        // a: 1, 3, 6   b: 1, 4, 10
        assert_eq!(checksum(&[1, 2, 3]), (6, 10));
        assert_eq!(checksum(&[]), (0, 0));
    }

    #[test]
    fn checksum_wraps_at_byte_boundary() {
        let (a, b) = checksum(&[0xFF, 0xFF]);
        assert_eq!(a, 0xFE);
        assert_eq!(b, 0xFF_u8.wrapping_add(0xFE));
    }

    #[test]
    fn encoded_frame_layout() {
        let frame = encode_frame(&[0xAA; 80]);
        assert_eq!(frame.len(), 88);
        assert_eq!(&frame[0..4], &[0xB5, 0x62, 0xFF, 0x01]);
        assert_eq!(&frame[4..6], &[80, 0]);
        assert_eq!(declared_length(&frame), Some(80));
        assert!(verify_checksum(&frame));
        assert!(has_valid_start(&frame));
    }

    #[test]
    fn empty_payload_frame_is_minimal() {
        let frame = encode_frame(&[]);
        assert_eq!(frame.len(), MIN_FRAME_LEN);
        assert!(verify_checksum(&frame));
        assert_eq!(payload_slice(&frame), Some(&[][..]));
    }

    #[test]
    fn short_chunks_never_verify() {
        for len in 0..MIN_FRAME_LEN {
            assert!(!verify_checksum(&vec![0u8; len]));
        }
    }

    #[test]
    fn payload_slice_rejects_overlong_declared_length() {
        let mut frame = encode_frame(&[1, 2, 3, 4]);
        frame[4] = 10;
        assert_eq!(payload_slice(&frame), None);
    }

    proptest! {
        #[test]
        fn encoded_frames_always_verify(payload in prop::collection::vec(any::<u8>(), 0..256)) {
            let frame = encode_frame(&payload);
            prop_assert!(verify_checksum(&frame));
            prop_assert_eq!(payload_slice(&frame), Some(payload.as_slice()));
        }

        #[test]
        fn flipping_a_trailer_byte_breaks_the_checksum(
            payload in prop::collection::vec(any::<u8>(), 0..128),
            which in 1usize..=2,
            delta in 1u8..=255,
        ) {
            let mut frame = encode_frame(&payload);
            let index = frame.len() - which;
            frame[index] = frame[index].wrapping_add(delta);
            prop_assert!(!verify_checksum(&frame));
        }
    }
}
