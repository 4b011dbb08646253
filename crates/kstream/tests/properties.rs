use kstream::{BitOrder, Error, Session, Stream, div_floor, mod_floor};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_bits_be_reassemble(bytes in prop::array::uniform8(any::<u8>()), n in 1u32..64) {
        let mut s = Stream::from_memory(bytes.to_vec());
        let a = s.read_bits(n, BitOrder::MsbFirst).unwrap();
        let b = s.read_bits(64 - n, BitOrder::MsbFirst).unwrap();

        prop_assert_eq!((a << (64 - n)) | b, u64::from_be_bytes(bytes));
        prop_assert!(s.is_eof());
        prop_assert_eq!(s.bits_left(), 0);
    }

    #[test]
    fn prop_bits_le_reassemble(bytes in prop::array::uniform8(any::<u8>()), n in 1u32..64) {
        let mut s = Stream::from_memory(bytes.to_vec());
        let a = s.read_bits(n, BitOrder::LsbFirst).unwrap();
        let b = s.read_bits(64 - n, BitOrder::LsbFirst).unwrap();

        prop_assert_eq!(a | (b << n), u64::from_le_bytes(bytes));
    }

    #[test]
    fn prop_bits_fit_width(data in prop::collection::vec(any::<u8>(), 8..32), n in 1u32..64) {
        let mut s = Stream::from_memory(data);
        let v = s.read_bits(n, BitOrder::MsbFirst).unwrap();
        prop_assert!(v < (1u64 << n));
    }

    #[test]
    fn prop_read_to_end_then_fail(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut ks = Session::default();
        let io = ks.open_memory(data.clone()).unwrap();

        let all = ks.read(io, |s| s.read_raw(data.len() as u64)).unwrap();
        prop_assert_eq!(all, data.clone());
        prop_assert!(ks.stream(io).unwrap().is_eof());

        let err = ks.read(io, |s| s.read_u1()).unwrap_err();
        let is_eos = matches!(err, Error::EndOfStream { .. });
        prop_assert!(is_eos);
        prop_assert_eq!(ks.stream(io).unwrap().pos(), data.len() as u64);
    }

    #[test]
    fn prop_substream_length(data in prop::collection::vec(any::<u8>(), 1..64), skip in 0usize..64, take in 0usize..64) {
        let skip = skip % data.len();
        let take = take % (data.len() - skip + 1);

        let mut ks = Session::default();
        let io = ks.open_memory(data.clone()).unwrap();
        ks.read(io, |s| s.read_raw(skip as u64)).unwrap();
        let bytes = ks.read_bytes(io, take as u64).unwrap();
        let sub = ks.stream_from_bytes(&bytes).unwrap();

        prop_assert_eq!(ks.stream(sub).unwrap().size(), take as u64);
        let content = ks.read(sub, |s| s.read_raw(take as u64)).unwrap();
        prop_assert_eq!(&content[..], &data[skip..skip + take]);
    }

    #[test]
    fn prop_xor_twice_is_identity(data in prop::collection::vec(any::<u8>(), 0..64), key in prop::collection::vec(any::<u8>(), 0..8)) {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&data).unwrap();
        let k = ks.bytes_from_slice(&key).unwrap();

        let once = ks.bytes_process_xor_bytes(&b, &k).unwrap();
        let twice = ks.bytes_process_xor_bytes(&once, &k).unwrap();
        prop_assert_eq!(ks.bytes_data(&twice).unwrap(), data);
    }

    #[test]
    fn prop_rotate_inverse(data in prop::collection::vec(any::<u8>(), 0..32), count in -16i32..16) {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&data).unwrap();

        let r = ks.bytes_process_rotate_left(&b, count).unwrap();
        let back = ks.bytes_process_rotate_left(&r, -count).unwrap();
        prop_assert_eq!(ks.bytes_data(&back).unwrap(), data);
    }

    #[test]
    fn prop_strip_right_idempotent(data in prop::collection::vec(0u8..4, 0..32), pad in 0u8..4) {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&data).unwrap();

        let once = ks.bytes_strip_right(&b, pad).unwrap();
        let twice = ks.bytes_strip_right(&once, pad).unwrap();
        let stripped = ks.bytes_data(&once).unwrap();

        prop_assert_eq!(ks.bytes_data(&twice).unwrap(), stripped.clone());
        prop_assert!(stripped.last() != Some(&pad));
        prop_assert_eq!(&data[..stripped.len()], &stripped[..]);
    }

    #[test]
    fn prop_terminate_excludes_term(data in prop::collection::vec(0u8..4, 0..32), term in 0u8..4) {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&data).unwrap();

        let cut = ks.bytes_terminate(&b, term, false).unwrap();
        let cut = ks.bytes_data(&cut).unwrap();

        prop_assert!(!cut.contains(&term));
        prop_assert_eq!(&data[..cut.len()], &cut[..]);
    }

    #[test]
    fn prop_floored_division(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        let (a, b) = (a as i64, b as i64);
        let q = div_floor(a, b);
        let r = mod_floor(a, b);

        prop_assert_eq!(q * b + r, a);
        prop_assert!(r == 0 || (r < 0) == (b < 0));
        prop_assert!(r.abs() < b.abs());
    }
}
