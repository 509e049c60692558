use rmp::Marker;

/// The frame prefix used a marker byte outside the accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unrecognized length marker 0x{0:02x}")]
    BadLengthTag(u8),
}

/// Encode a frame length as a msgpack unsigned integer.
///
/// Values below 0x80 are a positive fixint; wider values get the u8/u16/u32
/// marker followed by that many big-endian magnitude bytes.
pub fn encode_len(len: u32) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len <= u8::MAX as u32 {
        vec![Marker::U8.to_u8(), len as u8]
    } else if len <= u16::MAX as u32 {
        let mut out = vec![Marker::U16.to_u8()];
        out.extend_from_slice(&(len as u16).to_be_bytes());
        out
    } else {
        let mut out = vec![Marker::U32.to_u8()];
        out.extend_from_slice(&len.to_be_bytes());
        out
    }
}

/// Decode a frame length from the start of `buf`.
///
/// Returns the length and how many prefix bytes it occupied, or `None` when
/// `buf` does not yet hold the complete prefix (the caller keeps reading).
pub fn decode_len(buf: &[u8]) -> Result<Option<(u32, usize)>, FrameError> {
    let Some(&head) = buf.first() else {
        return Ok(None);
    };
    if head & 0x80 == 0 {
        return Ok(Some((head as u32, 1)));
    }

    let trailing = match Marker::from_u8(head) {
        Marker::U8 => 1,
        Marker::U16 => 2,
        Marker::U32 => 4,
        _ => return Err(FrameError::BadLengthTag(head)),
    };
    if buf.len() < 1 + trailing {
        return Ok(None);
    }

    let mut value = 0u32;
    for &byte in &buf[1..=trailing] {
        value = (value << 8) | byte as u32;
    }
    Ok(Some((value, 1 + trailing)))
}
