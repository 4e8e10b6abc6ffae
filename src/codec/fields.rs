//! Typed field grammar for message payloads.
//!
//! Each message payload is described by a fixed sequence of [`FieldKind`]s.
//! Decoding is all-or-nothing: the first failed read aborts the whole
//! application and no partial value list is ever returned.

use super::reader::ByteCursor;
use crate::error::Result;

/// Wire type of a single payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    F32,
    CString,
    /// Signed 16-bit vehicle id; a non-negative id is followed by a
    /// null-terminated name and a signed 8-bit seat index.
    Vehicle,
}

/// A vehicle reference carried inside a player update.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRef {
    pub id: i16,
    pub name: String,
    pub seat: i8,
}

/// Decoded value of a single payload field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    F32(f32),
    Str(String),
    Vehicle(Option<VehicleRef>),
}

impl FieldValue {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            FieldValue::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode one field of the given kind.
pub fn decode_field(cursor: &mut ByteCursor<'_>, kind: FieldKind) -> Result<FieldValue> {
    let value = match kind {
        FieldKind::U8 => FieldValue::U8(cursor.read_u8()?),
        FieldKind::I8 => FieldValue::I8(cursor.read_i8()?),
        FieldKind::U16 => FieldValue::U16(cursor.read_u16_le()?),
        FieldKind::I16 => FieldValue::I16(cursor.read_i16_le()?),
        FieldKind::U32 => FieldValue::U32(cursor.read_u32_le()?),
        FieldKind::F32 => FieldValue::F32(cursor.read_f32_le()?),
        FieldKind::CString => FieldValue::Str(cursor.read_cstring()?),
        FieldKind::Vehicle => FieldValue::Vehicle(decode_vehicle(cursor)?),
    };
    Ok(value)
}

/// Decode the optional vehicle variant: a negative id means no vehicle and
/// nothing follows it.
pub fn decode_vehicle(cursor: &mut ByteCursor<'_>) -> Result<Option<VehicleRef>> {
    let id = cursor.read_i16_le()?;
    if id >= 0 {
        let name = cursor.read_cstring()?;
        let seat = cursor.read_i8()?;
        Ok(Some(VehicleRef { id, name, seat }))
    } else {
        Ok(None)
    }
}

/// Apply a whole descriptor against the cursor.
pub fn decode_fields(cursor: &mut ByteCursor<'_>, descriptor: &[FieldKind]) -> Result<Vec<FieldValue>> {
    let mut values = Vec::with_capacity(descriptor.len());
    for &kind in descriptor {
        values.push(decode_field(cursor, kind)?);
    }
    Ok(values)
}
