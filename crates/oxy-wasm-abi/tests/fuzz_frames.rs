// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fuzz the container framing: arbitrary bytes must never panic.

use oxy_wasm_abi::codec::{Reader, Writer};
use oxy_wasm_abi::container::{read_frame, read_header, write_frame, write_header};
use proptest::prelude::*;

proptest! {
    #[test]
    fn fuzz_read_container_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let mut r = Reader::new(&bytes);
        if read_header(&mut r).is_ok() {
            while let Ok(Some(_)) = read_frame(&mut r) {}
        }
    }

    #[test]
    fn fuzz_frame_lengths(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16),
        cut in 0usize..64,
    ) {
        let mut w = Writer::default();
        write_header(&mut w);
        for p in &payloads {
            prop_assert!(write_frame(&mut w, p).is_ok());
        }
        let full = w.into_vec();

        let mut r = Reader::new(&full);
        prop_assert!(read_header(&mut r).is_ok());
        let mut seen = Vec::new();
        while let Some(frame) = read_frame(&mut r).ok().flatten() {
            seen.push(frame.to_vec());
        }
        prop_assert_eq!(&seen, &payloads);

        // Cutting bytes off the end must fail cleanly or stop at a boundary.
        let cut = cut.min(full.len().saturating_sub(8));
        let short = &full[..full.len() - cut];
        let mut r = Reader::new(short);
        prop_assert!(read_header(&mut r).is_ok());
        loop {
            match read_frame(&mut r) {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }
    }
}
