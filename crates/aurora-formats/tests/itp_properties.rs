#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Property tests for ITP encoding and forward-only decoding

use aurora_formats::itp::{ItpBuilder, ItpFile};
use aurora_formats::value::{LocString, Struct, Value};
use aurora_formats::{AuroraFormat, DecodeOptions};
use proptest::prelude::*;
use std::io::{self, Read};

/// Reader that hands out at most a few bytes per call and cannot seek
struct Trickle<'a> {
    data: &'a [u8],
    step: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.step).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,15}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u8>().prop_map(Value::U8),
        any::<i8>().prop_map(Value::I8),
        any::<u16>().prop_map(Value::U16),
        any::<i16>().prop_map(Value::I16),
        any::<u32>().prop_map(Value::U32),
        any::<i32>().prop_map(Value::I32),
        any::<u64>().prop_map(Value::U64),
        any::<i64>().prop_map(Value::I64),
        any::<f32>().prop_map(Value::F32),
        any::<f64>().prop_map(Value::F64),
        ".{0,24}".prop_map(Value::String),
        "[a-z_0-9]{0,16}".prop_map(Value::ResRef),
        (proptest::option::of(any::<u32>()), ".{0,12}").prop_map(|(str_ref, text)| {
            Value::LocString(LocString::new(str_ref.filter(|&r| r != LocString::NO_STR_REF)).with_text(0, text))
        }),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Binary),
        any::<u32>().prop_map(Value::StrRef),
    ]
}

fn structure() -> impl Strategy<Value = Struct> {
    let leaf = (any::<u32>(), proptest::collection::vec((name(), scalar()), 0..5))
        .prop_map(|(id, fields)| build_struct(id, fields));
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            any::<u32>(),
            proptest::collection::vec((name(), scalar()), 0..4),
            proptest::collection::vec(
                (
                    name(),
                    prop_oneof![
                        inner.clone().prop_map(Value::from),
                        proptest::collection::vec(inner, 0..3).prop_map(Value::list),
                    ],
                ),
                0..3,
            ),
        )
            .prop_map(|(id, mut fields, nested)| {
                fields.extend(nested);
                build_struct(id, fields)
            })
    })
}

fn build_struct(id: u32, fields: Vec<(String, Value)>) -> Struct {
    fields
        .into_iter()
        .fold(Struct::new(id), |s, (name, value)| s.with(name, value))
}

proptest! {
    #[test]
    fn built_trees_decode_strictly_from_a_trickle(root in structure(), step in 1usize..7) {
        let bytes = ItpBuilder::new(&root).build().unwrap();
        let reader = Trickle { data: &bytes, step };
        let file = ItpFile::read_with(reader, DecodeOptions::strict()).unwrap();
        prop_assert_eq!(&file.root, &root);
        prop_assert!(!file.reordered_reads);
    }

    #[test]
    fn rebuilding_a_decoded_file_is_byte_identical(root in structure()) {
        let bytes = ItpBuilder::new(&root).build().unwrap();
        prop_assert!(ItpFile::verify_round_trip(&bytes).is_ok());
    }

    #[test]
    fn truncated_files_never_decode(root in structure(), cut in 1usize..64) {
        // Every byte the builder writes is read back, so any cut is noticed
        let bytes = ItpBuilder::new(&root).build().unwrap();
        let cut = cut.min(bytes.len());
        let err = ItpFile::read(&bytes[..bytes.len() - cut]).unwrap_err();
        prop_assert!(err.is_corrupt_input());
    }
}
