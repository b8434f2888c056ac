//! Opaque DAKE identity-message header parsing (§6.2). This performs no DAKE
//! cryptography — it only extracts the fields `otr4_crypto::key_manager`
//! needs to seed a session (`Y`, `B`) and the opaque `user_profile_blob`
//! whose hash feeds `otr4_crypto::fingerprint`, mirroring how
//! `dl_proto::envelope::Envelope` only extracts routing/framing fields and
//! leaves ciphertext opaque to the relay.

use otr4_crypto::primitives::{Mpi, Point};

use crate::error::{ProtoError, Result};
use crate::wire;

pub const IDENTITY_MESSAGE_VERSION: u16 = 4;
pub const IDENTITY_MESSAGE_TYPE: u8 = 0x0F;

/// `version=4, type=0x0F, sender_tag, receiver_tag, user_profile_blob, point
/// Y, mpi B`.
pub struct IdentityMessageHeader {
    pub sender_tag: u32,
    pub receiver_tag: u32,
    pub user_profile_blob: Vec<u8>,
    pub y: Point,
    pub b: Mpi,
}

impl IdentityMessageHeader {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        wire::write_u16(buf, IDENTITY_MESSAGE_VERSION);
        wire::write_u8(buf, IDENTITY_MESSAGE_TYPE);
        wire::write_u32(buf, self.sender_tag);
        wire::write_u32(buf, self.receiver_tag);
        wire::write_data(buf, &self.user_profile_blob);
        wire::write_point(buf, &self.y);
        wire::write_mpi(buf, &self.b);
    }

    pub fn deserialize(buf: &[u8]) -> Result<(Self, usize)> {
        let (version, mut offset) = wire::read_u16(buf)?;
        if version != IDENTITY_MESSAGE_VERSION {
            return Err(ProtoError::Malformed(format!(
                "unsupported identity message version {version}"
            )));
        }
        let (msg_type, c) = wire::read_u8(&buf[offset..])?;
        offset += c;
        if msg_type != IDENTITY_MESSAGE_TYPE {
            return Err(ProtoError::Malformed(format!(
                "unexpected identity message type {msg_type:#x}"
            )));
        }
        let (sender_tag, c) = wire::read_u32(&buf[offset..])?;
        offset += c;
        let (receiver_tag, c) = wire::read_u32(&buf[offset..])?;
        offset += c;
        let (user_profile_blob, c) = wire::read_data(&buf[offset..])?;
        offset += c;
        let (y, c) = wire::read_point(&buf[offset..])?;
        offset += c;
        let (b, c) = wire::read_mpi(&buf[offset..])?;
        offset += c;
        Ok((
            IdentityMessageHeader {
                sender_tag,
                receiver_tag,
                user_profile_blob,
                y,
                b,
            },
            offset,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let header = IdentityMessageHeader {
            sender_tag: 0x1111_2222,
            receiver_tag: 0x3333_4444,
            user_profile_blob: b"opaque profile bytes".to_vec(),
            y: Point::generator(),
            b: Mpi::from_bytes_be(&[9u8; 8]),
        };
        let mut buf = Vec::new();
        header.serialize(&mut buf);
        let (decoded, consumed) = IdentityMessageHeader::deserialize(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded.sender_tag, header.sender_tag);
        assert_eq!(decoded.receiver_tag, header.receiver_tag);
        assert_eq!(decoded.user_profile_blob, header.user_profile_blob);
        assert_eq!(decoded.y.to_bytes(), header.y.to_bytes());
    }

    #[test]
    fn rejects_wrong_version() {
        let mut buf = Vec::new();
        wire::write_u16(&mut buf, 3);
        assert!(matches!(
            IdentityMessageHeader::deserialize(&buf),
            Err(ProtoError::Malformed(_))
        ));
    }
}
