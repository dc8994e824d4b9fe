//! Length-delimited binary wire format (protobuf wire compatible).
//!
//! Encoding rules:
//! - field tag: varint `(number << 3) | wire_type`
//! - int32/int64/bool: wire type 0, two's-complement varint
//! - double: wire type 1, 8 bytes IEEE 754 little-endian
//! - string / nested message: wire type 2, varint(length) + payload
//! - float: wire type 5, 4 bytes IEEE 754 little-endian
//! - repeated scalars: unpacked, one tagged record per element
//!
//! Decoding skips unknown field numbers by wire type, so a peer sending a
//! newer schema revision still parses.

use std::sync::Arc;

use pbj_tree::Scalar;

use crate::descriptor::{FieldKind, MessageDescriptor, ScalarKind};
use crate::message::{FieldValue, Message};

const WT_VARINT: u32 = 0;
const WT_FIXED64: u32 = 1;
const WT_LEN: u32 = 2;
const WT_FIXED32: u32 = 5;

/// Nested messages deeper than this fail decoding instead of recursing
/// further; hostile input must not be able to exhaust the stack.
const MAX_DEPTH: usize = 100;

/// Wire decoding error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("variable-length integer is too long")]
    VarIntTooLong,
    #[error("invalid field tag: {0}")]
    InvalidTag(u64),
    #[error("unsupported wire type: {0}")]
    UnsupportedWireType(u32),
    #[error("field {field:?} has mismatched wire type")]
    WireTypeMismatch { field: String },
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("message nesting exceeds depth limit")]
    DepthLimit,
}

/// Auto-growing byte writer.
pub struct Writer {
    buf: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn varint_u64(&mut self, mut n: u64) {
        loop {
            let low7 = (n & 0x7f) as u8;
            n >>= 7;
            if n == 0 {
                self.u8(low7);
                return;
            }
            self.u8(low7 | 0x80);
        }
    }

    pub fn fixed32(&mut self, n: u32) {
        self.bytes(&n.to_le_bytes());
    }

    pub fn fixed64(&mut self, n: u64) {
        self.bytes(&n.to_le_bytes());
    }

    pub fn tag(&mut self, number: u32, wire_type: u32) {
        self.varint_u64(((number as u64) << 3) | wire_type as u64);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Positioned reader over a byte slice.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    fn read_u8(&mut self) -> Result<u8, WireError> {
        let b = *self.data.get(self.pos).ok_or(WireError::EndOfInput)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::EndOfInput)?;
        if end > self.data.len() {
            return Err(WireError::EndOfInput);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn varint_u64(&mut self) -> Result<u64, WireError> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        for _ in 0..10 {
            let b = self.read_u8()?;
            result |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(WireError::VarIntTooLong)
    }

    pub fn fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_exact(4)?;
        // read_exact returned exactly four bytes.
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_exact(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }
}

fn scalar_wire_type(kind: ScalarKind) -> u32 {
    match kind {
        ScalarKind::Int32 | ScalarKind::Int64 | ScalarKind::Bool => WT_VARINT,
        ScalarKind::Double => WT_FIXED64,
        ScalarKind::Float => WT_FIXED32,
        ScalarKind::Str => WT_LEN,
    }
}

fn write_scalar(w: &mut Writer, number: u32, kind: ScalarKind, value: &Scalar) {
    match (kind, value) {
        (ScalarKind::Int32 | ScalarKind::Int64, Scalar::Int(n)) => {
            w.tag(number, WT_VARINT);
            w.varint_u64(*n as u64);
        }
        (ScalarKind::Bool, Scalar::Bool(b)) => {
            w.tag(number, WT_VARINT);
            w.varint_u64(u64::from(*b));
        }
        (ScalarKind::Float, Scalar::Float(f)) => {
            w.tag(number, WT_FIXED32);
            w.fixed32((*f as f32).to_bits());
        }
        (ScalarKind::Double, Scalar::Float(f)) => {
            w.tag(number, WT_FIXED64);
            w.fixed64(f.to_bits());
        }
        (ScalarKind::Str, Scalar::Str(s)) => {
            w.tag(number, WT_LEN);
            w.varint_u64(s.len() as u64);
            w.bytes(s.as_bytes());
        }
        // Setters normalize stored scalars to their declared kind; no
        // other combination can be stored.
        _ => {}
    }
}

fn write_message(w: &mut Writer, msg: &Message) {
    // Declared order keeps output deterministic regardless of set order.
    for field in msg.descriptor().fields() {
        let Some(value) = msg.get(&field.name) else {
            continue;
        };
        match (&field.kind, value) {
            (FieldKind::Scalar(kind), FieldValue::Scalar(s)) => {
                write_scalar(w, field.number, *kind, s);
            }
            (FieldKind::RepeatedScalar(kind), FieldValue::ScalarList(items)) => {
                for item in items {
                    write_scalar(w, field.number, *kind, item);
                }
            }
            (FieldKind::Message(_), FieldValue::Message(nested)) => {
                write_delimited(w, field.number, nested);
            }
            (FieldKind::RepeatedMessage(_), FieldValue::MessageList(items)) => {
                for item in items {
                    write_delimited(w, field.number, item);
                }
            }
            _ => {}
        }
    }
}

fn write_delimited(w: &mut Writer, number: u32, msg: &Message) {
    let mut inner = Writer::new();
    write_message(&mut inner, msg);
    let payload = inner.into_bytes();
    w.tag(number, WT_LEN);
    w.varint_u64(payload.len() as u64);
    w.bytes(&payload);
}

/// Serializes the set fields of `msg`.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut w = Writer::new();
    write_message(&mut w, msg);
    w.into_bytes()
}

/// Parses `data` as the wire encoding of `descriptor`.
pub fn decode_message(
    descriptor: Arc<MessageDescriptor>,
    data: &[u8],
) -> Result<Message, WireError> {
    let mut msg = Message::new(descriptor);
    merge_from(&mut msg, data, 0)?;
    Ok(msg)
}

fn read_scalar(r: &mut Reader<'_>, kind: ScalarKind) -> Result<Scalar, WireError> {
    match kind {
        // int32 truncates to 32 bits like protobuf does for oversized varints.
        ScalarKind::Int32 => Ok(Scalar::Int(i64::from(r.varint_u64()? as u32 as i32))),
        ScalarKind::Int64 => Ok(Scalar::Int(r.varint_u64()? as i64)),
        ScalarKind::Bool => Ok(Scalar::Bool(r.varint_u64()? != 0)),
        ScalarKind::Float => Ok(Scalar::Float(f64::from(f32::from_bits(r.fixed32()?)))),
        ScalarKind::Double => Ok(Scalar::Float(f64::from_bits(r.fixed64()?))),
        ScalarKind::Str => {
            let len = r.varint_u64()? as usize;
            let bytes = r.read_exact(len)?;
            let s = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
            Ok(Scalar::Str(s.to_string()))
        }
    }
}

fn skip_field(r: &mut Reader<'_>, wire_type: u32) -> Result<(), WireError> {
    match wire_type {
        WT_VARINT => {
            r.varint_u64()?;
        }
        WT_FIXED64 => {
            r.fixed64()?;
        }
        WT_LEN => {
            let len = r.varint_u64()? as usize;
            r.read_exact(len)?;
        }
        WT_FIXED32 => {
            r.fixed32()?;
        }
        other => return Err(WireError::UnsupportedWireType(other)),
    }
    Ok(())
}

fn merge_from(msg: &mut Message, data: &[u8], depth: usize) -> Result<(), WireError> {
    if depth > MAX_DEPTH {
        return Err(WireError::DepthLimit);
    }
    let descriptor = msg.descriptor().clone();
    let mut r = Reader::new(data);
    while r.has_remaining() {
        let tag = r.varint_u64()?;
        let number = (tag >> 3) as u32;
        let wire_type = (tag & 0x7) as u32;
        if number == 0 || tag >> 3 > u64::from(u32::MAX) {
            return Err(WireError::InvalidTag(tag));
        }
        let Some(field) = descriptor.field_by_number(number) else {
            skip_field(&mut r, wire_type)?;
            continue;
        };
        let mismatch = || WireError::WireTypeMismatch {
            field: field.name.clone(),
        };
        match &field.kind {
            FieldKind::Scalar(kind) => {
                if wire_type != scalar_wire_type(*kind) {
                    return Err(mismatch());
                }
                let value = read_scalar(&mut r, *kind)?;
                msg.set_scalar(&field.name, value).map_err(|_| mismatch())?;
            }
            FieldKind::RepeatedScalar(kind) => {
                if wire_type != scalar_wire_type(*kind) {
                    return Err(mismatch());
                }
                let value = read_scalar(&mut r, *kind)?;
                msg.append_scalar(&field.name, value)
                    .map_err(|_| mismatch())?;
            }
            FieldKind::Message(_) => {
                if wire_type != WT_LEN {
                    return Err(mismatch());
                }
                let len = r.varint_u64()? as usize;
                let payload = r.read_exact(len)?;
                let nested = msg.nested_mut(&field.name).map_err(|_| mismatch())?;
                merge_from(nested, payload, depth + 1)?;
            }
            FieldKind::RepeatedMessage(_) => {
                if wire_type != WT_LEN {
                    return Err(mismatch());
                }
                let len = r.varint_u64()? as usize;
                let payload = r.read_exact(len)?;
                let slot = msg.append_message(&field.name).map_err(|_| mismatch())?;
                merge_from(slot, payload, depth + 1)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MessageDescriptor;

    fn person() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("Person")
            .scalar("id", 1, ScalarKind::Int32)
            .scalar("name", 2, ScalarKind::Str)
            .scalar("email", 3, ScalarKind::Str)
            .build()
    }

    #[test]
    fn varint_wire_matrix() {
        let mut w = Writer::new();
        w.varint_u64(0);
        w.varint_u64(1);
        w.varint_u64(127);
        w.varint_u64(128);
        w.varint_u64(300);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0, 1, 0x7f, 0x80, 0x01, 0xac, 0x02]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.varint_u64().unwrap(), 0);
        assert_eq!(r.varint_u64().unwrap(), 1);
        assert_eq!(r.varint_u64().unwrap(), 127);
        assert_eq!(r.varint_u64().unwrap(), 128);
        assert_eq!(r.varint_u64().unwrap(), 300);
        assert!(!r.has_remaining());
    }

    #[test]
    fn varint_too_long_is_rejected() {
        let bytes = [0xffu8; 11];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.varint_u64(), Err(WireError::VarIntTooLong));
    }

    #[test]
    fn person_wire_bytes_match_protobuf() {
        let mut msg = Message::new(person());
        msg.set_scalar("id", Scalar::Int(1)).unwrap();
        msg.set_scalar("name", Scalar::Str("tester".into())).unwrap();
        // field 1 varint 1, field 2 length-delimited "tester"
        assert_eq!(
            msg.to_bytes(),
            b"\x08\x01\x12\x06tester".to_vec()
        );
    }

    #[test]
    fn negative_int_uses_ten_byte_varint() {
        let d = MessageDescriptor::builder("M")
            .scalar("n", 1, ScalarKind::Int64)
            .build();
        let mut msg = Message::new(d.clone());
        msg.set_scalar("n", Scalar::Int(-1)).unwrap();
        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), 1 + 10);
        let parsed = Message::parse(d, &bytes).unwrap();
        assert_eq!(parsed.get("n"), Some(&FieldValue::Scalar(Scalar::Int(-1))));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        // Encode with a wider descriptor, parse with a narrower one.
        let wide = MessageDescriptor::builder("Wide")
            .scalar("id", 1, ScalarKind::Int32)
            .scalar("extra", 9, ScalarKind::Str)
            .scalar("ratio", 10, ScalarKind::Double)
            .build();
        let narrow = MessageDescriptor::builder("Narrow")
            .scalar("id", 1, ScalarKind::Int32)
            .build();
        let mut msg = Message::new(wide);
        msg.set_scalar("id", Scalar::Int(7)).unwrap();
        msg.set_scalar("extra", Scalar::Str("ignored".into())).unwrap();
        msg.set_scalar("ratio", Scalar::Float(0.5)).unwrap();

        let parsed = Message::parse(narrow, &msg.to_bytes()).unwrap();
        assert_eq!(parsed.get("id"), Some(&FieldValue::Scalar(Scalar::Int(7))));
        assert!(parsed.get("extra").is_none());
    }

    #[test]
    fn truncated_input_is_end_of_input() {
        let mut msg = Message::new(person());
        msg.set_scalar("name", Scalar::Str("tester".into())).unwrap();
        let bytes = msg.to_bytes();
        assert_eq!(
            Message::parse(person(), &bytes[..bytes.len() - 1]).unwrap_err(),
            WireError::EndOfInput
        );
    }

    #[test]
    fn garbage_input_fails() {
        let garbage = b"this data is malformed because it is not a wire message.";
        assert!(Message::parse(person(), garbage).is_err());
    }

    #[test]
    fn float_and_bool_round_trip() {
        let d = MessageDescriptor::builder("M")
            .scalar("f", 1, ScalarKind::Float)
            .scalar("d", 2, ScalarKind::Double)
            .scalar("b", 3, ScalarKind::Bool)
            .build();
        let mut msg = Message::new(d.clone());
        msg.set_scalar("f", Scalar::Float(1.5)).unwrap();
        msg.set_scalar("d", Scalar::Float(0.25)).unwrap();
        msg.set_scalar("b", Scalar::Bool(true)).unwrap();
        let parsed = Message::parse(d, &msg.to_bytes()).unwrap();
        assert_eq!(parsed.get("f"), Some(&FieldValue::Scalar(Scalar::Float(1.5))));
        assert_eq!(parsed.get("d"), Some(&FieldValue::Scalar(Scalar::Float(0.25))));
        assert_eq!(parsed.get("b"), Some(&FieldValue::Scalar(Scalar::Bool(true))));
    }

    #[test]
    fn hostile_nesting_hits_depth_limit() {
        // Wrap field 1 in itself deeper than the decoder allows, growing a
        // matching descriptor chain alongside the payload.
        let mut descriptor = MessageDescriptor::builder("Leaf")
            .scalar("n", 2, ScalarKind::Int32)
            .build();
        let mut payload: Vec<u8> = Vec::new();
        for _ in 0..(MAX_DEPTH + 2) {
            let mut w = Writer::new();
            w.tag(1, WT_LEN);
            w.varint_u64(payload.len() as u64);
            w.bytes(&payload);
            payload = w.into_bytes();
            descriptor = MessageDescriptor::builder("Chain")
                .message("next", 1, descriptor)
                .build();
        }
        assert_eq!(
            Message::parse(descriptor, &payload).unwrap_err(),
            WireError::DepthLimit
        );
    }
}
