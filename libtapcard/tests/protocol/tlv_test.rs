#[path = "../common/mod.rs"]
mod common;

use common::fixtures;
use libtapcard::tlv::{TlvCursor, encode, find_path};
use proptest::prelude::*;

#[test]
fn ppse_directory_walks_to_both_aids() {
    let resp = fixtures::ppse(&[(&fixtures::VISA_AID, "VISA"), (&fixtures::MC_AID, "MC")]);
    let mut cur = TlvCursor::over_response(&resp).unwrap();
    let fci = cur.find(0x6F).unwrap().unwrap();
    let a5 = fci.child_cursor().find(0xA5).unwrap().unwrap();
    let dir = a5.child_cursor().find(0xBF0C).unwrap().unwrap();

    let mut apps = dir.child_cursor();
    let mut aids = Vec::new();
    while let Some(node) = apps.next_node().unwrap() {
        assert_eq!(node.tag(), 0x61);
        let aid = node.child_cursor().find(0x4F).unwrap().unwrap();
        aids.push(aid.data_bytes().to_vec());
    }
    assert_eq!(aids, vec![fixtures::VISA_AID.to_vec(), fixtures::MC_AID.to_vec()]);
}

#[test]
fn path_lookup_reaches_label() {
    let fci = fixtures::application_fci("VISA CREDIT", Some(&fixtures::PDOL));
    let body = &fci[..fci.len() - 2];
    let label = find_path(body, &[0x6F, 0xA5, 0x50]).unwrap().unwrap();
    assert_eq!(label, b"VISA CREDIT");
    let pdol = find_path(body, &[0x6F, 0xA5, 0x9F38]).unwrap().unwrap();
    assert_eq!(pdol, &fixtures::PDOL[..]);
    assert!(find_path(body, &[0x6F, 0x88]).unwrap().is_none());
}

#[test]
fn long_form_length() {
    let value = vec![0x5A; 200];
    let tlv = encode(0x70, &value);
    assert_eq!(&tlv[..3], &[0x70, 0x81, 200]);
    let node = TlvCursor::new(&tlv).next_node().unwrap().unwrap();
    assert_eq!(node.data_length(), 200);
    assert_eq!(node.end(), tlv.len());
}

#[test]
fn length_past_buffer_is_malformed() {
    // 5A claims 8 bytes, 2 present
    let bad = [0x5A, 0x08, 0x41, 0x11];
    assert!(TlvCursor::new(&bad).next_node().is_err());
}

proptest! {
    #[test]
    fn cursor_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut cur = TlvCursor::new(&bytes);
        for _ in 0..64 {
            match cur.next_node() {
                Ok(Some(node)) => prop_assert!(node.end() <= bytes.len()),
                _ => break,
            }
        }
    }

    #[test]
    fn generated_records_walk_back_exactly(
        records in prop::collection::vec((tag(), value_len(), any::<u8>()), 0..6)
    ) {
        let mut buf = Vec::new();
        let mut expected = Vec::new();
        for &(tag, len, fill) in &records {
            let tag_len = if tag > 0xFF { 2 } else { 1 };
            let len_len = match len {
                n if n < 0x80 => 1,
                n if n <= 0xFF => 2,
                _ => 3,
            };
            expected.push((tag, buf.len() + tag_len + len_len, len));
            buf.extend(encode(tag, &vec![fill; len]));
        }

        let mut cur = TlvCursor::new(&buf);
        let mut walked = Vec::new();
        while let Some(node) = cur.next_node().unwrap() {
            prop_assert!(node.data_bytes().iter().all(|&b| b == records[walked.len()].2));
            walked.push((node.tag(), node.data_offset(), node.data_length()));
        }
        prop_assert_eq!(walked, expected);
        prop_assert!(cur.next_node().unwrap().is_none());
    }
}

/// One-byte tags never have all five low bits set; two-byte tags always do.
fn tag() -> impl Strategy<Value = u32> {
    prop_oneof![
        any::<u8>()
            .prop_filter("two-byte marker", |b| b & 0x1F != 0x1F)
            .prop_map(u32::from),
        (any::<u8>(), any::<u8>()).prop_map(|(hi, lo)| u32::from(hi | 0x1F) << 8 | u32::from(lo)),
        Just(0x9F38),
    ]
}

/// Short, `81` and `82` length forms.
fn value_len() -> impl Strategy<Value = usize> {
    prop_oneof![0usize..0x80, 0x80usize..0x100, 0x100usize..0x140]
}
