//! Schema header: the struct descriptors a message carries in front of its
//! root type id.
//!
//! ```text
//! [u8 typeCount]
//!   typeCount × [u16 typeId][u8 fieldCount]
//!                 fieldCount × [u16 fieldType][u8 nameLen][name]
//! ```

use std::collections::BTreeSet;

use crate::buffer::{Buffer, ReadBuffer};
use crate::error::{CodecError, Result};
use crate::registry::{FieldDescriptor, StructDescriptor, TypeRegistry};
use crate::types::TypeId;

/// Writes a header listing `types` in descending id order.
pub(crate) fn write_header<'t>(
    buf: &mut Buffer,
    registry: &TypeRegistry,
    types: impl DoubleEndedIterator<Item = &'t TypeId> + ExactSizeIterator,
) -> Result<()> {
    let count = types.len();
    if count > u8::MAX as usize {
        return Err(CodecError::TooManyTypes(count));
    }
    buf.write_byte(count as u8);

    for id in types.rev() {
        let descriptor = registry.descriptor(*id)?;
        buf.put_u16(id.raw());
        buf.write_byte(descriptor.fields.len() as u8);
        for field in &descriptor.fields {
            buf.put_u16(field.type_id.raw());
            buf.write_byte(field.name.len() as u8);
            buf.write_bytes(field.name.as_bytes());
        }
    }
    Ok(())
}

/// Header with no embedded types.
pub(crate) fn write_empty_header(buf: &mut Buffer) {
    buf.write_byte(0);
}

/// Reads a header and adds the types the registry does not know yet.
///
/// Known types are skipped without being parsed. Returns the ids that were
/// newly registered.
pub(crate) fn read_header(
    buf: &mut ReadBuffer<'_>,
    registry: &mut TypeRegistry,
) -> Result<BTreeSet<TypeId>> {
    let count = buf.read_byte()?;
    let mut incoming = Vec::new();

    for _ in 0..count {
        let id = TypeId::new(buf.read_u16()?);
        let field_count = buf.read_byte()?;
        if !id.is_struct() {
            return Err(CodecError::MalformedPayload(format!(
                "header declares non-struct type id {id}"
            )));
        }

        if registry.contains(id) {
            for _ in 0..field_count {
                buf.next(2)?;
                let len = buf.read_byte()? as usize;
                buf.next(len)?;
            }
            tracing::debug!(type_id = %id, "header type already cached, skipping");
            continue;
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let type_id = TypeId::new(buf.read_u16()?);
            let len = buf.read_byte()? as usize;
            let name = std::str::from_utf8(buf.read_bytes(len)?)
                .map_err(|_| CodecError::InvalidUtf8)?;
            fields.push(FieldDescriptor {
                name: name.to_owned(),
                type_id,
                size: 0,
            });
        }
        incoming.push(StructDescriptor {
            id,
            fields,
            size: 0,
        });
    }

    let added = incoming.iter().map(|d| d.id).collect();
    registry.insert_wire_types(incoming)?;
    Ok(added)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::buffer::ByteOrder;
    use crate::types::{FieldType, Kind, StructSchema};

    fn primed() -> (TypeRegistry, TypeId, TypeId) {
        let nested = Arc::new(
            StructSchema::builder("main.NStruct")
                .field("Nint", FieldType::Int32)
                .build(),
        );
        let outer = Arc::new(
            StructSchema::builder("main.TestStruct")
                .field("Id", FieldType::Int32)
                .nested("Nested", nested)
                .build(),
        );
        let mut registry = TypeRegistry::new();
        let outer_id = registry.get_or_register(&outer).unwrap().id;
        let nested_id = registry.id_of("main.NStruct").unwrap();
        (registry, outer_id, nested_id)
    }

    #[test]
    fn types_are_written_in_descending_order() {
        let (registry, outer, nested) = primed();
        let used = BTreeSet::from([outer, nested]);
        let mut buf = Buffer::new(ByteOrder::Big);
        write_header(&mut buf, &registry, used.iter()).unwrap();

        #[rustfmt::skip]
        let expected = [
            2,
            0x00, 28, 1,
                0x00, 5, 4, b'N', b'i', b'n', b't',
            0x00, 27, 2,
                0x00, 5, 2, b'I', b'd',
                0x00, 28, 6, b'N', b'e', b's', b't', b'e', b'd',
        ];
        assert_eq!(buf.bytes(), &expected);
    }

    #[test]
    fn header_populates_a_fresh_registry() {
        let (registry, outer, nested) = primed();
        let used = BTreeSet::from([outer, nested]);
        let mut buf = Buffer::new(ByteOrder::Little);
        write_header(&mut buf, &registry, used.iter()).unwrap();

        let mut fresh = TypeRegistry::new();
        let mut reader = ReadBuffer::new(buf.bytes(), ByteOrder::Little);
        let added = read_header(&mut reader, &mut fresh).unwrap();
        assert_eq!(added, used);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(fresh.type_size(outer).unwrap(), 8);
        assert_eq!(
            fresh.descriptor(outer).unwrap().fields[1].type_id,
            nested
        );
    }

    #[test]
    fn known_types_are_skipped() {
        let (mut registry, outer, nested) = primed();
        let used = BTreeSet::from([outer, nested]);
        let mut buf = Buffer::new(ByteOrder::Big);
        write_header(&mut buf, &registry, used.iter()).unwrap();
        buf.put_u16(0xABCD);

        let mut reader = ReadBuffer::new(buf.bytes(), ByteOrder::Big);
        let added = read_header(&mut reader, &mut registry).unwrap();
        assert!(added.is_empty());
        assert_eq!(reader.read_u16().unwrap(), 0xABCD);
        assert_eq!(registry.schema(outer).unwrap().name(), "main.TestStruct");
    }

    #[test]
    fn empty_header_is_one_byte() {
        let mut buf = Buffer::new(ByteOrder::Big);
        write_empty_header(&mut buf);
        assert_eq!(buf.bytes(), &[0]);

        let mut registry = TypeRegistry::new();
        let mut reader = ReadBuffer::new(buf.bytes(), ByteOrder::Big);
        assert!(read_header(&mut reader, &mut registry).unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn truncated_header_fails() {
        let data = [1, 0x00, 27, 1, 0x00, 5, 9, b'x'];
        let mut registry = TypeRegistry::new();
        let mut reader = ReadBuffer::new(&data, ByteOrder::Big);
        assert!(read_header(&mut reader, &mut registry).unwrap_err().is_truncation());
    }

    #[test]
    fn header_cannot_redefine_primitives() {
        let data = [1, 0x00, Kind::String.code() as u8, 0];
        let mut registry = TypeRegistry::new();
        let mut reader = ReadBuffer::new(&data, ByteOrder::Big);
        assert!(matches!(
            read_header(&mut reader, &mut registry),
            Err(CodecError::MalformedPayload(_))
        ));
    }

    #[test]
    fn too_many_types() {
        let registry = TypeRegistry::new();
        let ids: Vec<TypeId> = (0..256).map(|i| TypeId::new(27 + i)).collect();
        let mut buf = Buffer::new(ByteOrder::Big);
        assert_eq!(
            write_header(&mut buf, &registry, ids.iter()).unwrap_err(),
            CodecError::TooManyTypes(256)
        );
    }
}
