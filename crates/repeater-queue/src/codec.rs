use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::RecordError;

/// Record header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "RP" (0x52 0x50).
pub const MAGIC: [u8; 2] = [0x52, 0x50];

/// Default maximum payload accepted by [`decode_record`]: 1 MiB.
pub const DEFAULT_MAX_RECORD: usize = 1024 * 1024;

/// Encode one record with its length inlined in front of the payload.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Payload         │
/// │ 0x52 0x50    │ (4B LE)   │ (Length bytes)  │
/// │ "RP"         │           │                 │
/// └──────────────┴───────────┴─────────────────┘
/// ```
pub fn encode_record(payload: &[u8], dst: &mut BytesMut) -> Result<(), RecordError> {
    if payload.len() > u32::MAX as usize {
        return Err(RecordError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one record from the front of `src`.
///
/// Returns `Ok(None)` if `src` does not hold a complete record yet. On success
/// the record bytes are consumed from `src`.
pub fn decode_record(
    src: &mut BytesMut,
    max_payload: usize,
) -> Result<Option<Bytes>, RecordError> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(RecordError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if payload_len > max_payload {
        return Err(RecordError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}
