//! The codec: encode and decode whole messages.
//!
//! Wire layout of one message:
//!
//! ```text
//! [schema header][u16 rootTypeId][fixed-size root payload][reference table]
//! ```

pub mod decode;
pub mod encode;
pub mod header;

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::buffer::{Buffer, ByteOrder};
use crate::error::{CodecError, Result};
use crate::record::{Record, fill_record, to_struct_value};
use crate::reference::ReferenceWriter;
use crate::registry::{StructDescriptor, TypeRegistry};
use crate::types::{FieldType, StructSchema, TypeId, Value};

use self::encode::Encoder;

/// Default initial size of the main buffer and the reference table.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Default reference id width in bits.
pub const DEFAULT_ADDRESS_WIDTH: u8 = 16;

/// Builder for configuring a [`Codec`].
#[derive(Debug, Clone)]
pub struct CodecBuilder {
    order: ByteOrder,
    buffer_capacity: usize,
    address_width: u8,
    resend_known_types: bool,
}

impl Default for CodecBuilder {
    fn default() -> Self {
        Self {
            order: ByteOrder::Big,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            address_width: DEFAULT_ADDRESS_WIDTH,
            resend_known_types: false,
        }
    }
}

impl CodecBuilder {
    /// Sets the byte order of every multi-byte number.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the initial capacity of the encode buffers.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets the reference id width in bits (8 or 16).
    pub fn address_width(mut self, bits: u8) -> Self {
        self.address_width = bits;
        self
    }

    /// When set, every full encode embeds all the struct types the message
    /// uses, so each message decodes on its own. By default a type is
    /// embedded only the first time this codec sends it.
    pub fn resend_known_types(mut self, resend: bool) -> Self {
        self.resend_known_types = resend;
        self
    }

    pub fn build(self) -> Result<Codec> {
        let refs = ReferenceWriter::new(self.address_width, self.buffer_capacity, self.order)?;
        Ok(Codec {
            order: self.order,
            registry: TypeRegistry::new(),
            header: Buffer::new(self.order),
            main: Buffer::with_capacity(self.buffer_capacity, self.order),
            refs,
            used: BTreeSet::new(),
            sent: BTreeSet::new(),
            resend_known_types: self.resend_known_types,
        })
    }
}

/// A codec instance: one type registry plus reusable encode scratch space.
///
/// The registry persists across calls, which is what lets later messages
/// omit types the peer has already seen. The scratch buffers are reset at
/// the start of every encode. A codec is not meant to be shared between
/// concurrent callers; use one instance per thread.
#[derive(Debug)]
pub struct Codec {
    order: ByteOrder,
    registry: TypeRegistry,
    header: Buffer,
    main: Buffer,
    refs: ReferenceWriter,
    used: BTreeSet<TypeId>,
    sent: BTreeSet<TypeId>,
    resend_known_types: bool,
}

impl Codec {
    /// Creates a codec with default settings and the given byte order.
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            registry: TypeRegistry::new(),
            header: Buffer::new(order),
            main: Buffer::with_capacity(DEFAULT_BUFFER_CAPACITY, order),
            refs: ReferenceWriter::with_capacity(DEFAULT_BUFFER_CAPACITY, order),
            used: BTreeSet::new(),
            sent: BTreeSet::new(),
            resend_known_types: false,
        }
    }

    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Read access to the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Registers `T`'s schema (and every struct it contains) without
    /// encoding anything.
    pub fn register<T: Record>(&mut self) -> Result<Arc<StructDescriptor>> {
        self.registry.get_or_register(&T::schema())
    }

    pub fn register_schema(&mut self, schema: &Arc<StructSchema>) -> Result<Arc<StructDescriptor>> {
        self.registry.get_or_register(schema)
    }

    /// Forgets which types earlier headers carried, so the next full
    /// encode embeds every type it uses again.
    pub fn forget_sent_types(&mut self) {
        self.sent.clear();
    }

    /// Encodes a record without a schema header. The decoding side must
    /// already know every struct type involved.
    pub fn encode<T: Record>(&mut self, value: &T) -> Result<Bytes> {
        let struct_value = Value::Struct(to_struct_value(value));
        self.encode_root(&FieldType::Struct(T::schema()), &struct_value, false)
    }

    /// Encodes a record with its schema header.
    pub fn encode_full<T: Record>(&mut self, value: &T) -> Result<Bytes> {
        let struct_value = Value::Struct(to_struct_value(value));
        self.encode_root(&FieldType::Struct(T::schema()), &struct_value, true)
    }

    /// Encodes any value without a schema header; the root type is
    /// inferred from the value.
    pub fn encode_value(&mut self, value: &Value) -> Result<Bytes> {
        self.encode_root(&value.infer_type(), value, false)
    }

    /// Encodes any value with its schema header.
    pub fn encode_value_full(&mut self, value: &Value) -> Result<Bytes> {
        self.encode_root(&value.infer_type(), value, true)
    }

    /// Encodes `value` as type `ty`, e.g. to pin the element types of a
    /// collection that inference would widen to `any`.
    pub fn encode_as(
        &mut self,
        ty: &FieldType,
        value: &Value,
        include_schema: bool,
    ) -> Result<Bytes> {
        self.encode_root(ty, value, include_schema)
    }

    fn reset(&mut self) {
        self.header.reset();
        self.main.reset();
        self.refs.reset();
        self.used.clear();
    }

    fn encode_root(
        &mut self,
        ty: &FieldType,
        value: &Value,
        include_schema: bool,
    ) -> Result<Bytes> {
        self.reset();

        let root = Encoder::new(
            &mut self.registry,
            &mut self.main,
            &mut self.refs,
            &mut self.used,
        )
        .encode_root(ty, value)?;

        if include_schema {
            let types: Vec<TypeId> = if self.resend_known_types {
                self.used.iter().copied().collect()
            } else {
                self.used.difference(&self.sent).copied().collect()
            };
            header::write_header(&mut self.header, &self.registry, types.iter())?;
            self.sent.extend(types);
        } else {
            header::write_empty_header(&mut self.header);
        }

        let refs = self.refs.bytes();
        let mut out = BytesMut::with_capacity(self.header.len() + self.main.len() + refs.len());
        out.extend_from_slice(self.header.bytes());
        out.extend_from_slice(self.main.bytes());
        out.extend_from_slice(refs);

        tracing::trace!(
            root = %root,
            header = self.header.len(),
            body = self.main.len(),
            refs = self.refs.count(),
            total = out.len(),
            "encoded message"
        );
        Ok(out.freeze())
    }

    /// Decodes a message into `out`, matching wire fields to `T`'s fields
    /// by name. Fields of `T` that the message lacks keep their values.
    pub fn decode<T: Record>(&mut self, out: &mut T, bytes: &[u8]) -> Result<()> {
        match self.decode_value(bytes)? {
            Value::Struct(value) => fill_record(out, value),
            other => Err(CodecError::NotAddressable(format!(
                "cannot decode a {} root into {}",
                other.type_name(),
                T::schema().name()
            ))),
        }
    }

    /// Decodes a message of any root type.
    ///
    /// Types embedded in the header are added to the registry first; struct
    /// types known only from a header come back with a schema named
    /// `wire.Type<id>`.
    pub fn decode_value(&mut self, bytes: &[u8]) -> Result<Value> {
        decode::decode_message(&mut self.registry, self.order, bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;
    use crate::record::FieldValue;
    use crate::types::{FIRST_STRUCT_ID, StructValue};

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct NStruct as "main.NStruct" {
            nint: i32 => "Nint",
            floa: f64 => "Floa",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct TestStruct as "main.TestStruct" {
            id: i32 => "Id",
            value: f32 => "Value",
            nested: NStruct => "Nested",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Mixed as "main.Mixed" {
            name: String => "Name",
            tags: Vec<String> => "Tags",
            points: Vec<NStruct> => "Points",
            attrs: HashMap<String, Value> => "Attrs",
            extra: Value => "Extra",
            small: i8 => "Small",
            count: usize => "Count",
            flag: bool => "Flag",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Blob as "main.Blob" {
            data: Vec<u8> => "Data",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Reading as "main.Reading" {
            v: i32 => "V",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Batch as "main.Batch" {
            items: Vec<Reading> => "Items",
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Counts as "main.Counts" {
            by_name: HashMap<String, i32> => "M",
        }
    }

    fn sample() -> TestStruct {
        TestStruct {
            id: 49,
            value: 32720.2383,
            nested: NStruct {
                nint: 99,
                floa: 28973892.3833,
            },
        }
    }

    #[test]
    fn full_round_trip_into_fresh_codec() {
        let mut sender = Codec::new(ByteOrder::Big);
        let bytes = sender.encode_full(&sample()).unwrap();
        assert_eq!(bytes.len(), 65);

        let mut receiver = Codec::new(ByteOrder::Big);
        let mut out = TestStruct::default();
        receiver.decode(&mut out, &bytes).unwrap();

        assert_eq!(out.id, 49);
        assert_eq!(out.value.to_bits(), 32720.2383f32.to_bits());
        assert_eq!(out.nested.nint, 99);
        assert_eq!(out.nested.floa.to_bits(), 28973892.3833f64.to_bits());
    }

    #[test]
    fn full_encode_layout() {
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_full(&sample()).unwrap();

        // Two types, nested one first.
        assert_eq!(&bytes[..4], &[2, 0x00, 28, 2]);
        let body = &bytes[43..];
        assert_eq!(&body[..6], &[0x00, 27, 0x00, 0x00, 0x00, 49]);
        assert_eq!(&body[6..10], &32720.2383f32.to_be_bytes());
        assert_eq!(&body[10..14], &99i32.to_be_bytes());
        assert_eq!(&body[14..], &28973892.3833f64.to_be_bytes());
    }

    #[test]
    fn second_full_encode_omits_sent_types() {
        let mut sender = Codec::new(ByteOrder::Big);
        let first = sender.encode_full(&sample()).unwrap();
        let second = sender.encode_full(&sample()).unwrap();
        assert_eq!(first[0], 2);
        assert_eq!(second[0], 0);
        assert_eq!(second.len(), 1 + 22);

        let mut receiver = Codec::new(ByteOrder::Big);
        let mut out = TestStruct::default();
        receiver.decode(&mut out, &first).unwrap();
        assert_eq!(receiver.registry().len(), 2);
        receiver.decode(&mut out, &second).unwrap();
        assert_eq!(receiver.registry().len(), 2);
        assert_eq!(out, sample());
    }

    #[test]
    fn resent_headers_are_skipped_by_the_decoder() {
        let mut sender = Codec::builder().resend_known_types(true).build().unwrap();
        let first = sender.encode_full(&sample()).unwrap();
        let second = sender.encode_full(&sample()).unwrap();
        assert_eq!(first, second);

        let mut receiver = Codec::new(ByteOrder::Big);
        receiver.decode_value(&first).unwrap();
        let id = TypeId::new(FIRST_STRUCT_ID);
        let before = Arc::clone(receiver.registry().get(id).unwrap());
        receiver.decode_value(&second).unwrap();
        assert!(Arc::ptr_eq(&before, receiver.registry().get(id).unwrap()));
        assert_eq!(receiver.registry().len(), 2);
    }

    #[test]
    fn forget_sent_types_embeds_again() {
        let mut sender = Codec::new(ByteOrder::Big);
        sender.encode_full(&sample()).unwrap();
        sender.forget_sent_types();
        assert_eq!(sender.encode_full(&sample()).unwrap()[0], 2);
    }

    #[test]
    fn schemaless_encode_needs_a_primed_registry() {
        let mut sender = Codec::new(ByteOrder::Big);
        let bytes = sender.encode(&sample()).unwrap();
        assert_eq!(bytes[0], 0);

        let mut cold = Codec::new(ByteOrder::Big);
        let mut out = TestStruct::default();
        assert_eq!(
            cold.decode(&mut out, &bytes).unwrap_err(),
            CodecError::UnknownType(TypeId::new(FIRST_STRUCT_ID))
        );

        let mut primed = Codec::new(ByteOrder::Big);
        primed.register::<TestStruct>().unwrap();
        primed.decode(&mut out, &bytes).unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn little_endian_round_trip() {
        let mut codec = Codec::builder()
            .byte_order(ByteOrder::Little)
            .buffer_capacity(8)
            .build()
            .unwrap();
        let bytes = codec.encode_full(&sample()).unwrap();
        assert_eq!(&bytes[43..45], &[27, 0x00]);

        let mut out = TestStruct::default();
        Codec::new(ByteOrder::Little).decode(&mut out, &bytes).unwrap();
        assert_eq!(out, sample());
    }

    #[test]
    fn map_scenario() {
        let map = Value::Map(vec![
            (Value::from("Int"), Value::Int32(5)),
            (Value::from("Name"), Value::from("serhii")),
        ]);
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_value_full(&map).unwrap();
        let decoded = Codec::new(ByteOrder::Big).decode_value(&bytes).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn mixed_record_round_trip() {
        let mixed = Mixed {
            name: "point cloud".into(),
            tags: vec!["a".into(), String::new(), "ccc".into()],
            points: vec![
                NStruct {
                    nint: 1,
                    floa: 0.5,
                },
                NStruct {
                    nint: -7,
                    floa: f64::MAX,
                },
            ],
            attrs: HashMap::from([
                ("n".to_owned(), Value::Int64(-3)),
                ("list".to_owned(), Value::List(vec![Value::Uint16(1), Value::Uint16(2)])),
                ("none".to_owned(), Value::Null),
            ]),
            extra: Value::Struct(to_struct_value(&NStruct {
                nint: 3,
                floa: 3.0,
            })),
            small: -128,
            count: 4096,
            flag: true,
        };

        let mut sender = Codec::new(ByteOrder::Big);
        let bytes = sender.encode_full(&mixed).unwrap();

        let mut out = Mixed::default();
        Codec::new(ByteOrder::Big).decode(&mut out, &bytes).unwrap();
        assert_eq!(out.name, mixed.name);
        assert_eq!(out.tags, mixed.tags);
        assert_eq!(out.points, mixed.points);
        assert_eq!(out.attrs, mixed.attrs);
        assert_eq!(out.small, -128);
        assert_eq!(out.count, 4096);
        assert!(out.flag);

        // The receiver only knows the struct carried in `extra` by id.
        let extra = out.extra.as_struct().unwrap();
        assert!(extra.schema().name().starts_with("wire.Type"));
        assert_eq!(extra.get("Nint"), Some(&Value::Int32(3)));
        assert_eq!(NStruct::from_value(out.extra.clone()).unwrap().floa, 3.0);
    }

    #[test]
    fn any_payload_struct_is_in_the_header() {
        let mut codec = Codec::new(ByteOrder::Big);
        let holder = Mixed {
            extra: Blob::default().to_value(),
            ..Mixed::default()
        };
        codec.encode_full(&holder).unwrap();
        let blob = codec.registry().id_of("main.Blob").unwrap();
        assert!(codec.sent.contains(&blob));
    }

    #[test]
    fn reference_ids_follow_field_order() {
        let schema = Arc::new(
            StructSchema::builder("main.Strings")
                .field("A", FieldType::String)
                .field("B", FieldType::String)
                .field("C", FieldType::String)
                .build(),
        );
        let value = Value::Struct(StructValue::new(
            Arc::clone(&schema),
            vec![Value::from("one"), Value::from("two"), Value::from("three")],
        ));
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_value(&value).unwrap();
        assert_eq!(&bytes[1..9], &[0x00, 27, 0x00, 1, 0x00, 2, 0x00, 3]);

        let decoded = codec.decode_value(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn max_length_reference() {
        let mut codec = Codec::new(ByteOrder::Big);
        let ok = Blob {
            data: vec![7; 65535],
        };
        let bytes = codec.encode_full(&ok).unwrap();
        let mut out = Blob::default();
        Codec::new(ByteOrder::Big).decode(&mut out, &bytes).unwrap();
        assert_eq!(out, ok);

        let too_big = Blob {
            data: vec![7; 65536],
        };
        assert_eq!(
            codec.encode_full(&too_big).unwrap_err(),
            CodecError::LengthOverflow(65536)
        );
    }

    #[test]
    fn empty_values_round_trip() {
        let empty = Mixed::default();
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_full(&empty).unwrap();
        let mut out = Mixed {
            name: "stale".into(),
            tags: vec!["stale".into()],
            ..Mixed::default()
        };
        Codec::new(ByteOrder::Big).decode(&mut out, &bytes).unwrap();
        assert_eq!(out, empty);
    }

    #[test]
    fn non_struct_root_is_not_addressable() {
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_value(&Value::Int32(1)).unwrap();
        let mut out = TestStruct::default();
        assert!(matches!(
            codec.decode(&mut out, &bytes),
            Err(CodecError::NotAddressable(_))
        ));
    }

    #[test]
    fn missing_output_field() {
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_full(&sample()).unwrap();
        let mut out = NStruct::default();
        let mut receiver = Codec::new(ByteOrder::Big);
        assert!(matches!(
            receiver.decode(&mut out, &bytes),
            Err(CodecError::FieldNotFound(_))
        ));
    }

    #[test]
    fn truncated_message() {
        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_full(&sample()).unwrap();
        for cut in [0, 1, 20, 44, 50, bytes.len() - 1] {
            let mut receiver = Codec::new(ByteOrder::Big);
            let err = receiver.decode_value(&bytes[..cut]).unwrap_err();
            assert!(err.is_truncation(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn eight_bit_references_overflow() {
        let mut codec = Codec::builder().address_width(8).build().unwrap();
        let many = Value::List((0..300).map(|i| Value::from(i.to_string())).collect());
        assert_eq!(
            codec.encode_value(&many).unwrap_err(),
            CodecError::AddressOverflow { width: 8 }
        );
    }

    #[test]
    fn invalid_address_width() {
        assert!(matches!(
            Codec::builder().address_width(12).build(),
            Err(CodecError::InvalidConfig(_))
        ));
    }

    #[test]
    fn decoded_wire_types_re_encode() {
        let mut sender = Codec::new(ByteOrder::Big);
        let bytes = sender.encode_full(&sample()).unwrap();

        let mut relay = Codec::new(ByteOrder::Big);
        let value = relay.decode_value(&bytes).unwrap();
        let forwarded = relay.encode_value_full(&value).unwrap();
        assert_eq!(forwarded, bytes);
    }

    #[test]
    fn slice_of_earlier_registered_struct_decodes_cold() {
        let mut sender = Codec::new(ByteOrder::Big);
        let reading_id = sender.register::<Reading>().unwrap().id;
        let batch = Batch {
            items: vec![Reading { v: 7 }],
        };
        let bytes = sender.encode_full(&batch).unwrap();
        // The parent comes first in the header, ahead of its element type.
        assert_eq!(&bytes[..4], &[2, 0x00, FIRST_STRUCT_ID as u8 + 1, 1]);
        assert_eq!(&bytes[4..6], &reading_id.with_array_flag().raw().to_be_bytes());

        let mut receiver = Codec::new(ByteOrder::Big);
        let mut out = Batch::default();
        receiver.decode(&mut out, &bytes).unwrap();
        assert_eq!(out, batch);

        let mut relay = Codec::new(ByteOrder::Big);
        let value = relay.decode_value(&bytes).unwrap();
        assert_eq!(relay.encode_value_full(&value).unwrap(), bytes);
    }

    #[test]
    fn relayed_map_field_keeps_its_types() {
        let counts = Counts {
            by_name: HashMap::from([("a".to_owned(), 5)]),
        };
        let mut sender = Codec::new(ByteOrder::Big);
        let bytes = sender.encode_full(&counts).unwrap();

        let mut relay = Codec::new(ByteOrder::Big);
        let value = relay.decode_value(&bytes).unwrap();
        let Value::Struct(decoded) = &value else {
            panic!("expected a struct, got {value:?}");
        };
        assert_eq!(
            decoded.schema().fields()[0].ty,
            FieldType::map(FieldType::String, FieldType::Int32)
        );
        assert_eq!(relay.encode_value_full(&value).unwrap(), bytes);

        // Later messages decode against the narrowed schema.
        let again = sender.encode(&counts).unwrap();
        let value = relay.decode_value(&again).unwrap();
        assert_eq!(relay.encode_value(&value).unwrap(), again);
    }

    #[test]
    fn encode_as_pins_collection_types() {
        let ty = FieldType::map(FieldType::String, FieldType::Int32);
        let map = Value::Map(vec![(Value::from("a"), Value::Int32(1))]);

        let mut codec = Codec::new(ByteOrder::Big);
        let bytes = codec.encode_as(&ty, &map, false).unwrap();
        assert_eq!(&bytes[..7], &[0, 0x00, 21, 0x00, 5, 0x00, 24]);
        assert_eq!(codec.decode_value(&bytes).unwrap(), map);

        let wrong = Value::Map(vec![(Value::from("a"), Value::from("b"))]);
        assert!(matches!(
            codec.encode_as(&ty, &wrong, false),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn register_schema_primes_without_encoding() {
        let schema = Arc::new(
            StructSchema::builder("main.Pair")
                .field("K", FieldType::Uint16)
                .field("V", FieldType::Float64)
                .build(),
        );
        let mut codec = Codec::new(ByteOrder::Big);
        let descriptor = codec.register_schema(&schema).unwrap();
        assert_eq!(descriptor.size, 10);
        assert_eq!(codec.registry().id_of("main.Pair"), Some(descriptor.id));
        assert_eq!(codec.registry().type_size(descriptor.id).unwrap(), 10);
    }

    fn integer() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i8>().prop_map(Value::Int8),
            any::<i16>().prop_map(Value::Int16),
            any::<i32>().prop_map(Value::Int32),
            any::<i64>().prop_map(Value::Int64),
            any::<u8>().prop_map(Value::Uint8),
            any::<u16>().prop_map(Value::Uint16),
            any::<u32>().prop_map(Value::Uint32),
            any::<u64>().prop_map(Value::Uint64),
            any::<i32>().prop_map(|i| Value::Int(i as isize)),
            any::<u32>().prop_map(|u| Value::Uint(u as usize)),
        ]
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            integer(),
            any::<bool>().prop_map(Value::Bool),
            (-1e30f64..1e30).prop_map(Value::Float64),
            (-1e6f32..1e6).prop_map(Value::Float32),
            ".{0,12}".prop_map(Value::String),
            Just(Value::Null),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
                prop::collection::vec((".{0,4}".prop_map(Value::String), inner), 0..4)
                    .prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn values_round_trip(v in value(), little in any::<bool>()) {
            let order = if little { ByteOrder::Little } else { ByteOrder::Big };
            let mut codec = Codec::new(order);
            let bytes = codec.encode_value_full(&v).unwrap();
            let decoded = Codec::new(order).decode_value(&bytes).unwrap();
            prop_assert_eq!(decoded, v);
        }
    }
}
