//! Fixed-width and length-prefixed wire primitives (§4.B): big-endian
//! integers, the `data` and `mpi` encodings, and the fixed-size point/scalar
//! encodings built on `otr4_crypto::primitives`.
//!
//! Every reader returns `(value, bytes_consumed)` rather than mutating a
//! cursor, following `dl_proto::codec::unpad`'s "slice in, value + validated
//! length out" shape.

use otr4_crypto::primitives::{Mpi, Point, Scalar};

use crate::error::{ProtoError, Result};

const MAX_PLAUSIBLE_LEN: u32 = 1 << 24;

pub fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn read_u8(buf: &[u8]) -> Result<(u8, usize)> {
    let byte = *buf.first().ok_or_else(|| ProtoError::Malformed("buffer too short for u8".into()))?;
    Ok((byte, 1))
}

pub fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn read_u16(buf: &[u8]) -> Result<(u16, usize)> {
    let bytes = buf
        .get(..2)
        .ok_or_else(|| ProtoError::Malformed("buffer too short for u16".into()))?;
    Ok((u16::from_be_bytes([bytes[0], bytes[1]]), 2))
}

pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn read_u32(buf: &[u8]) -> Result<(u32, usize)> {
    let bytes = buf
        .get(..4)
        .ok_or_else(|| ProtoError::Malformed("buffer too short for u32".into()))?;
    Ok((u32::from_be_bytes(bytes.try_into().unwrap()), 4))
}

pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn read_u64(buf: &[u8]) -> Result<(u64, usize)> {
    let bytes = buf
        .get(..8)
        .ok_or_else(|| ProtoError::Malformed("buffer too short for u64".into()))?;
    Ok((u64::from_be_bytes(bytes.try_into().unwrap()), 8))
}

/// `u32 length` then `length` raw bytes.
pub fn write_data(buf: &mut Vec<u8>, data: &[u8]) {
    write_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

pub fn read_data(buf: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (len, consumed) = read_u32(buf)?;
    if len > MAX_PLAUSIBLE_LEN || len as usize > buf.len().saturating_sub(consumed) {
        return Err(ProtoError::Malformed(format!(
            "data length {len} exceeds remaining buffer"
        )));
    }
    let start = consumed;
    let end = start + len as usize;
    Ok((buf[start..end].to_vec(), end))
}

/// `u32 length` then minimal big-endian unsigned bytes; zero encodes as
/// length=0, no bytes.
pub fn write_mpi(buf: &mut Vec<u8>, mpi: &Mpi) {
    let bytes = mpi.to_bytes_be();
    write_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(&bytes);
}

pub fn read_mpi(buf: &[u8]) -> Result<(Mpi, usize)> {
    let (len, consumed) = read_u32(buf)?;
    if len > MAX_PLAUSIBLE_LEN || len as usize > buf.len().saturating_sub(consumed) {
        return Err(ProtoError::Malformed(format!(
            "mpi length {len} exceeds remaining buffer"
        )));
    }
    let start = consumed;
    let end = start + len as usize;
    Ok((Mpi::from_bytes_be(&buf[start..end]), end))
}

/// Fixed 57-byte Edwards-448 point encoding.
pub fn write_point(buf: &mut Vec<u8>, point: &Point) {
    buf.extend_from_slice(&point.to_bytes());
}

pub fn read_point(buf: &[u8]) -> Result<(Point, usize)> {
    const LEN: usize = otr4_crypto::primitives::POINT_LEN;
    let bytes = buf
        .get(..LEN)
        .ok_or_else(|| ProtoError::Malformed("buffer too short for point".into()))?;
    let point = Point::from_bytes(bytes).map_err(|e| ProtoError::Malformed(e.to_string()))?;
    Ok((point, LEN))
}

/// Fixed 56-byte little-endian scalar encoding.
pub fn write_scalar(buf: &mut Vec<u8>, scalar: &Scalar) {
    buf.extend_from_slice(&scalar.to_bytes());
}

pub fn read_scalar(buf: &[u8]) -> Result<(Scalar, usize)> {
    const LEN: usize = otr4_crypto::primitives::SCALAR_LEN;
    let bytes = buf
        .get(..LEN)
        .ok_or_else(|| ProtoError::Malformed("buffer too short for scalar".into()))?;
    let scalar = Scalar::from_bytes(bytes).map_err(|e| ProtoError::Malformed(e.to_string()))?;
    Ok((scalar, LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_roundtrip() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xdead_beef);
        let (v, consumed) = read_u32(&buf).unwrap();
        assert_eq!(v, 0xdead_beef);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn data_roundtrip() {
        let mut buf = Vec::new();
        write_data(&mut buf, b"hello");
        let (v, consumed) = read_data(&buf).unwrap();
        assert_eq!(v, b"hello");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn data_rejects_truncated_buffer() {
        let mut buf = Vec::new();
        write_data(&mut buf, b"hello world");
        buf.truncate(6);
        assert!(matches!(read_data(&buf), Err(ProtoError::Malformed(_))));
    }

    #[test]
    fn mpi_zero_roundtrip() {
        let mut buf = Vec::new();
        write_mpi(&mut buf, &Mpi::zero());
        let (v, consumed) = read_mpi(&buf).unwrap();
        assert_eq!(v.to_bytes_be(), Mpi::zero().to_bytes_be());
        assert_eq!(consumed, 4);
    }

    #[test]
    fn point_roundtrip() {
        let mut buf = Vec::new();
        let p = Point::generator();
        write_point(&mut buf, &p);
        let (decoded, consumed) = read_point(&buf).unwrap();
        assert_eq!(decoded.to_bytes(), p.to_bytes());
        assert_eq!(consumed, otr4_crypto::primitives::POINT_LEN);
    }

    #[test]
    fn scalar_roundtrip() {
        let mut buf = Vec::new();
        let mut bytes = [0u8; otr4_crypto::primitives::SCALAR_LEN];
        bytes[0] = 7;
        let s = Scalar::from_bytes(&bytes).unwrap();
        write_scalar(&mut buf, &s);
        let (decoded, consumed) = read_scalar(&buf).unwrap();
        assert_eq!(decoded.to_bytes(), s.to_bytes());
        assert_eq!(consumed, otr4_crypto::primitives::SCALAR_LEN);
    }
}
