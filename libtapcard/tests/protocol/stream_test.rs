use libtapcard::constants::ACK_FRAME;
use libtapcard::protocol::{Frame, FrameReader};

#[test]
fn ack_and_data_in_one_chunk() {
    let mut chunk = ACK_FRAME.to_vec();
    chunk.extend(Frame::encode(&[0xD5, 0x4B, 0x00]).unwrap());

    let mut reader = FrameReader::new();
    reader.push(&chunk);
    let frames = reader.drain_frames().unwrap();
    assert_eq!(frames, vec![Frame::Ack, Frame::Data(vec![0xD5, 0x4B, 0x00])]);
    assert_eq!(reader.pending(), 0);
}

#[test]
fn frame_split_byte_by_byte() {
    let frame = Frame::encode(&[0xD5, 0x03, 0x33, 0x02, 0x07, 0x07]).unwrap();
    let mut reader = FrameReader::new();
    for (i, b) in frame.iter().enumerate() {
        reader.push(&[*b]);
        let next = reader.next_frame().unwrap();
        if i + 1 < frame.len() {
            assert!(next.is_none());
        } else {
            assert!(matches!(next, Some(Frame::Data(_))));
        }
    }
}

#[test]
fn corrupt_frame_clears_buffer() {
    let mut frame = Frame::encode(&[0xD5, 0x41, 0x00]).unwrap();
    let n = frame.len();
    frame[n - 2] ^= 0xFF;
    let mut reader = FrameReader::new();
    reader.push(&frame);
    let err = reader.next_frame().unwrap_err();
    assert!(err.is_framing());
    assert_eq!(reader.pending(), 0);
}
