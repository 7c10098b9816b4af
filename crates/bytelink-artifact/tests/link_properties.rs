use bytelink_artifact::{link, Address, AddressMap, Bytecode, LinkError, LinkReference};
use proptest::prelude::*;

const ADDR_LEN: usize = Address::EVM_LEN;

/// Bytecode plus a set of disjoint 20-byte references into it
fn template_with_slots() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    (1..8usize)
        .prop_flat_map(|slots| {
            let len = slots * ADDR_LEN + 64;
            (
                proptest::collection::vec(any::<u8>(), len),
                proptest::collection::btree_set(0..slots, 0..=slots),
                Just(len),
            )
        })
        .prop_flat_map(|(code, slots, len)| {
            // Slot i covers [i * 20 + pad, i * 20 + pad + 20), one pad shared by all.
            let starts: Vec<usize> = slots.into_iter().map(|i| i * ADDR_LEN).collect();
            let pad_limit = (len - starts.last().map_or(0, |s| s + ADDR_LEN)).max(1);
            (Just(code), Just(starts), 0..pad_limit)
        })
        .prop_map(|(code, starts, pad)| {
            let starts = starts.into_iter().map(|s| s + pad).collect();
            (code, starts)
        })
}

fn references(starts: &[usize]) -> (Vec<LinkReference>, AddressMap) {
    let refs = starts
        .iter()
        .enumerate()
        .map(|(i, &s)| LinkReference::new(format!("Lib{i}"), s, ADDR_LEN))
        .collect();
    let map = AddressMap::from_pairs(
        (0..starts.len()).map(|i| (format!("Lib{i}"), Address::repeat_byte(i as u8 + 1, ADDR_LEN))),
    )
    .unwrap();
    (refs, map)
}

proptest! {
    #[test]
    fn prop_link_preserves_length((code, starts) in template_with_slots()) {
        let template = Bytecode::from_bytes(&code);
        let (refs, map) = references(&starts);

        let linked = link(&template, &refs, &map).unwrap();

        prop_assert_eq!(linked.len(), template.len());
    }

    #[test]
    fn prop_link_only_changes_reference_ranges((code, starts) in template_with_slots()) {
        let template = Bytecode::from_bytes(&code);
        let (refs, map) = references(&starts);

        let linked = link(&template, &refs, &map).unwrap().to_bytes().unwrap();

        for (i, byte) in linked.iter().enumerate() {
            let owner = refs.iter().position(|r| r.start <= i && i < r.start + r.length);
            match owner {
                Some(k) => {
                    prop_assert_eq!(*byte, k as u8 + 1);
                }
                None => {
                    prop_assert_eq!(*byte, code[i]);
                }
            }
        }
    }

    #[test]
    fn prop_link_is_deterministic((code, starts) in template_with_slots()) {
        let template = Bytecode::from_bytes(&code);
        let (refs, map) = references(&starts);

        let first = link(&template, &refs, &map).unwrap();
        let second = link(&template, &refs, &map).unwrap();
        let mut reversed = refs.clone();
        reversed.reverse();
        let third = link(&template, &reversed, &map).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &third);
    }

    #[test]
    fn prop_overlapping_pair_is_rejected(start in 0..40usize, shift in 1..ADDR_LEN) {
        let template = Bytecode::from_bytes(&[0u8; 128]);
        let refs = [
            LinkReference::new("A", start, ADDR_LEN),
            LinkReference::new("B", start + shift, ADDR_LEN),
        ];
        let map = AddressMap::from_pairs([
            ("A", Address::repeat_byte(1, ADDR_LEN)),
            ("B", Address::repeat_byte(2, ADDR_LEN)),
        ]).unwrap();

        let result = link(&template, &refs, &map);
        let is_invalid = matches!(result, Err(LinkError::InvalidLinkReference { .. }));
        prop_assert!(is_invalid);
    }

    #[test]
    fn prop_out_of_bounds_is_rejected(len in 1..100usize, overhang in 1..50usize) {
        let template = Bytecode::from_bytes(&vec![0u8; len]);
        let start = (len + overhang).saturating_sub(ADDR_LEN);
        let refs = [LinkReference::new("A", start, ADDR_LEN)];
        let map = AddressMap::from_pairs([("A", Address::repeat_byte(1, ADDR_LEN))]).unwrap();

        let result = link(&template, &refs, &map);
        let is_invalid = matches!(result, Err(LinkError::InvalidLinkReference { .. }));
        prop_assert!(is_invalid);
    }
}

#[test]
fn scenario_library_at_offset_100() {
    let template = Bytecode::from_bytes(&(0..=255u8).collect::<Vec<_>>());
    let refs = [LinkReference::new("Step1", 100, 20)];
    let address = Address::repeat_byte(0xaa, 20);
    let map = AddressMap::from_pairs([("Step1", address.clone())]).unwrap();

    let linked = link(&template, &refs, &map).unwrap().to_bytes().unwrap();
    let original = template.to_bytes().unwrap();

    assert_eq!(&linked[100..120], address.as_bytes());
    assert_eq!(&linked[..100], &original[..100]);
    assert_eq!(&linked[120..], &original[120..]);
}

#[test]
fn twenty_byte_slot_rejects_thirty_two_byte_address() {
    let template = Bytecode::from_bytes(&[0u8; 64]);
    let refs = [LinkReference::new("Lib", 0, 20)];
    let map = AddressMap::from_pairs([("Lib", Address::repeat_byte(0xaa, 32))]).unwrap();

    assert_eq!(
        link(&template, &refs, &map),
        Err(LinkError::LinkMismatch { library: "Lib".into(), expected: 20, actual: 32 })
    );
}
