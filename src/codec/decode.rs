//! Decoding: header + main buffer + reference table → value tree.

use std::sync::Arc;

use crate::buffer::{ByteOrder, ReadBuffer};
use crate::error::{CodecError, Result};
use crate::reference::{NULL_REF, ReferenceReader};
use crate::registry::TypeRegistry;
use crate::types::{Kind, StructValue, TypeId, Value};

use super::header::read_header;

/// Deepest chain of reference blobs one value may follow.
pub const MAX_DEPTH: usize = 128;

/// Decodes one message, inserting header types into `registry` first.
pub(crate) fn decode_message(
    registry: &mut TypeRegistry,
    order: ByteOrder,
    bytes: &[u8],
) -> Result<Value> {
    let mut buf = ReadBuffer::new(bytes, order);
    let added = read_header(&mut buf, registry)?;

    let root = TypeId::new(buf.read_u16()?);
    let body_start = buf.position();
    let body_len = registry.type_size(root)?;
    let refs_start = body_start + body_len;
    if refs_start > bytes.len() {
        return Err(CodecError::OutOfBounds {
            needed: body_len,
            remaining: bytes.len() - body_start,
        });
    }

    let mut refs = ReferenceReader::new(order);
    refs.init(&bytes[refs_start..])?;

    let mut body = ReadBuffer::new(&bytes[..refs_start], order);
    body.goto_pos(body_start)?;

    let mut decoder = Decoder {
        registry,
        buf: body,
        refs,
        depth: 0,
    };
    let value = decoder.read(root)?;
    tracing::trace!(
        root = %root,
        new_types = added.len(),
        body = body_len,
        refs = decoder.refs.len(),
        "decoded message"
    );
    Ok(value)
}

/// Walks the body of one message. The cursor is redirected into reference
/// blobs while their contents are read.
struct Decoder<'a, 'c> {
    registry: &'c mut TypeRegistry,
    buf: ReadBuffer<'a>,
    refs: ReferenceReader<'a>,
    depth: usize,
}

impl<'a> Decoder<'a, '_> {
    fn read(&mut self, id: TypeId) -> Result<Value> {
        if id.is_array() {
            return self.read_slice(id.element_type());
        }
        if id.is_struct() {
            return self.read_struct(id);
        }
        let kind = id.kind().ok_or(CodecError::UnknownType(id))?;
        let value = match kind {
            Kind::Bool => Value::Bool(self.buf.read_byte()? != 0),
            Kind::Int => Value::Int(self.buf.read_i32()? as isize),
            Kind::Int8 => Value::Int8(self.buf.read_i8()?),
            Kind::Int16 => Value::Int16(self.buf.read_i16()?),
            Kind::Int32 => Value::Int32(self.buf.read_i32()?),
            Kind::Int64 => Value::Int64(self.buf.read_i64()?),
            Kind::Uint => Value::Uint(self.buf.read_u32()? as usize),
            Kind::Uint8 => Value::Uint8(self.buf.read_byte()?),
            Kind::Uint16 => Value::Uint16(self.buf.read_u16()?),
            Kind::Uint32 => Value::Uint32(self.buf.read_u32()?),
            Kind::Uint64 => Value::Uint64(self.buf.read_u64()?),
            Kind::Float32 => Value::Float32(self.buf.read_f32()?),
            Kind::Float64 => Value::Float64(self.buf.read_f64()?),
            Kind::String => {
                let blob = self.blob()?;
                let s = std::str::from_utf8(blob).map_err(|_| CodecError::InvalidUtf8)?;
                Value::String(s.to_owned())
            }
            Kind::Map => self.read_map()?.0,
            Kind::Interface => self.read_any()?,
            Kind::Slice | Kind::Struct => {
                return Err(CodecError::UnsupportedKind(format!(
                    "bare {kind} type id on the wire"
                )));
            }
        };
        Ok(value)
    }

    /// Reads a reference id at the cursor and returns its blob.
    fn blob(&mut self) -> Result<&'a [u8]> {
        let id = self.buf.read_u16()?;
        self.refs.get(id)
    }

    /// Runs `f` with the cursor at the start of `blob`.
    fn within<R>(&mut self, blob: &'a [u8], f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::MalformedPayload(format!(
                "references nested deeper than {MAX_DEPTH}"
            )));
        }
        self.depth += 1;
        self.buf.push_state(blob, 0);
        let result = f(self);
        self.buf.pop_state();
        self.depth -= 1;
        result
    }

    /// Number of `item_size`-byte items packed in `blob`.
    fn item_count(blob: &[u8], item_size: usize, what: TypeId) -> Result<usize> {
        if item_size == 0 {
            return Ok(0);
        }
        if blob.len() % item_size != 0 {
            return Err(CodecError::MalformedPayload(format!(
                "{} byte blob is not a whole number of {item_size} byte {what} items",
                blob.len()
            )));
        }
        Ok(blob.len() / item_size)
    }

    fn read_struct(&mut self, id: TypeId) -> Result<Value> {
        let descriptor = Arc::clone(self.registry.descriptor(id)?);
        let mut fields = Vec::with_capacity(descriptor.fields.len());
        let mut map_slots = Vec::new();
        for (index, field) in descriptor.fields.iter().enumerate() {
            if field.type_id.kind() == Some(Kind::Map) {
                let (map, key, elem) = self.read_map()?;
                map_slots.push((index, key, elem));
                fields.push(map);
            } else {
                fields.push(self.read(field.type_id)?);
            }
        }
        let schema = if map_slots.is_empty() {
            Arc::clone(self.registry.schema(id)?)
        } else {
            self.registry.narrow_map_fields(id, &map_slots)?
        };
        Ok(Value::Struct(StructValue::new(schema, fields)))
    }

    fn read_slice(&mut self, elem: TypeId) -> Result<Value> {
        let blob = self.blob()?;
        let count = Self::item_count(blob, self.registry.type_size(elem)?, elem)?;
        let items = self.within(blob, |dec| {
            (0..count).map(|_| dec.read(elem)).collect::<Result<Vec<_>>>()
        })?;
        Ok(Value::List(items))
    }

    /// Returns the map with the key and element ids from its slot.
    fn read_map(&mut self) -> Result<(Value, TypeId, TypeId)> {
        let elem = TypeId::new(self.buf.read_u16()?);
        let key = TypeId::new(self.buf.read_u16()?);
        let blob = self.blob()?;
        let pair_size = self.registry.type_size(key)? + self.registry.type_size(elem)?;
        let count = Self::item_count(blob, pair_size, elem)?;
        let pairs = self.within(blob, |dec| {
            let mut pairs = Vec::with_capacity(count);
            for _ in 0..count {
                let k = dec.read(key)?;
                let v = dec.read(elem)?;
                pairs.push((k, v));
            }
            Ok(pairs)
        })?;
        Ok((Value::Map(pairs), key, elem))
    }

    /// Reads the concrete type id embedded at the front of the blob and
    /// decodes the rest with it.
    fn read_any(&mut self) -> Result<Value> {
        let id = self.buf.read_u16()?;
        if id == NULL_REF {
            return Ok(Value::Null);
        }
        let blob = self.refs.get(id)?;
        self.within(blob, |dec| {
            let concrete = TypeId::new(dec.buf.read_u16()?);
            dec.read(concrete)
        })
    }
}
