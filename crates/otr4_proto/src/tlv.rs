//! TLV envelope and SMP message encoding (§4.I, §6.1): `type: u16, length:
//! u16, value: length bytes`. The envelope carries no framing of its own —
//! the enclosing secure-channel record is a concatenation of TLVs, mirroring
//! how `dl_proto::envelope::Envelope` is one record among many the relay
//! forwards without inspecting.

use otr4_crypto::smp::{Smp1, Smp2, Smp3, Smp4};

use crate::error::{ProtoError, Result};
use crate::wire;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TlvType {
    Smp1,
    Smp2,
    Smp3,
    Smp4,
    SmpAbort,
}

impl TlvType {
    fn as_u16(self) -> u16 {
        match self {
            TlvType::Smp1 => 2,
            TlvType::Smp2 => 3,
            TlvType::Smp3 => 4,
            TlvType::Smp4 => 5,
            TlvType::SmpAbort => 6,
        }
    }

    fn from_u16(v: u16) -> Result<Self> {
        match v {
            2 => Ok(TlvType::Smp1),
            3 => Ok(TlvType::Smp2),
            4 => Ok(TlvType::Smp3),
            5 => Ok(TlvType::Smp4),
            6 => Ok(TlvType::SmpAbort),
            other => Err(ProtoError::Malformed(format!("unknown TLV type {other}"))),
        }
    }
}

pub struct Tlv {
    pub tlv_type: TlvType,
    pub value: Vec<u8>,
}

impl Tlv {
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        wire::write_u16(buf, self.tlv_type.as_u16());
        wire::write_u16(buf, self.value.len() as u16);
        buf.extend_from_slice(&self.value);
    }

    pub fn deserialize(buf: &[u8]) -> Result<(Self, usize)> {
        let (type_raw, mut offset) = wire::read_u16(buf)?;
        let tlv_type = TlvType::from_u16(type_raw)?;
        let (len, consumed) = wire::read_u16(&buf[offset..])?;
        offset += consumed;
        let len = len as usize;
        if len > buf.len().saturating_sub(offset) {
            return Err(ProtoError::Malformed(
                "TLV length exceeds remaining buffer".into(),
            ));
        }
        let value = buf[offset..offset + len].to_vec();
        Ok((Tlv { tlv_type, value }, offset + len))
    }
}

/// `(optional_question, G2a, c2, d2, G3a, c3, d3)`.
pub fn encode_smp1(msg: &Smp1) -> Vec<u8> {
    let mut buf = Vec::new();
    wire::write_data(&mut buf, msg.question.as_deref().unwrap_or("").as_bytes());
    wire::write_point(&mut buf, &msg.g2a);
    wire::write_scalar(&mut buf, &msg.c2);
    wire::write_scalar(&mut buf, &msg.d2);
    wire::write_point(&mut buf, &msg.g3a);
    wire::write_scalar(&mut buf, &msg.c3);
    wire::write_scalar(&mut buf, &msg.d3);
    buf
}

pub fn decode_smp1(buf: &[u8]) -> Result<Smp1> {
    let (question_bytes, mut offset) = wire::read_data(buf)?;
    let question = if question_bytes.is_empty() {
        None
    } else {
        Some(
            String::from_utf8(question_bytes)
                .map_err(|e| ProtoError::Malformed(e.to_string()))?,
        )
    };
    let (g2a, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (c2, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d2, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (g3a, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (c3, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d3, _) = wire::read_scalar(&buf[offset..])?;
    Ok(Smp1 {
        question,
        g2a,
        c2,
        d2,
        g3a,
        c3,
        d3,
    })
}

/// `(G2b, c2, d2, G3b, c3, d3, Pb, Qb, cp, d5, d6)`.
pub fn encode_smp2(msg: &Smp2) -> Vec<u8> {
    let mut buf = Vec::new();
    wire::write_point(&mut buf, &msg.g2b);
    wire::write_scalar(&mut buf, &msg.c2);
    wire::write_scalar(&mut buf, &msg.d2);
    wire::write_point(&mut buf, &msg.g3b);
    wire::write_scalar(&mut buf, &msg.c3);
    wire::write_scalar(&mut buf, &msg.d3);
    wire::write_point(&mut buf, &msg.pb);
    wire::write_point(&mut buf, &msg.qb);
    wire::write_scalar(&mut buf, &msg.cp);
    wire::write_scalar(&mut buf, &msg.d5);
    wire::write_scalar(&mut buf, &msg.d6);
    buf
}

pub fn decode_smp2(buf: &[u8]) -> Result<Smp2> {
    let mut offset = 0;
    let (g2b, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (c2, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d2, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (g3b, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (c3, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d3, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (pb, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (qb, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (cp, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d5, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d6, _) = wire::read_scalar(&buf[offset..])?;
    Ok(Smp2 {
        g2b,
        c2,
        d2,
        g3b,
        c3,
        d3,
        pb,
        qb,
        cp,
        d5,
        d6,
    })
}

/// `(Pa, Qa, cp, d5, d6, Ra, cr, d7)`.
pub fn encode_smp3(msg: &Smp3) -> Vec<u8> {
    let mut buf = Vec::new();
    wire::write_point(&mut buf, &msg.pa);
    wire::write_point(&mut buf, &msg.qa);
    wire::write_scalar(&mut buf, &msg.cp);
    wire::write_scalar(&mut buf, &msg.d5);
    wire::write_scalar(&mut buf, &msg.d6);
    wire::write_point(&mut buf, &msg.ra);
    wire::write_scalar(&mut buf, &msg.cr);
    wire::write_scalar(&mut buf, &msg.d7);
    buf
}

pub fn decode_smp3(buf: &[u8]) -> Result<Smp3> {
    let mut offset = 0;
    let (pa, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (qa, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (cp, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d5, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d6, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (ra, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (cr, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d7, _) = wire::read_scalar(&buf[offset..])?;
    Ok(Smp3 {
        pa,
        qa,
        cp,
        d5,
        d6,
        ra,
        cr,
        d7,
    })
}

/// `(Rb, cr, d7)`.
pub fn encode_smp4(msg: &Smp4) -> Vec<u8> {
    let mut buf = Vec::new();
    wire::write_point(&mut buf, &msg.rb);
    wire::write_scalar(&mut buf, &msg.cr);
    wire::write_scalar(&mut buf, &msg.d7);
    buf
}

pub fn decode_smp4(buf: &[u8]) -> Result<Smp4> {
    let mut offset = 0;
    let (rb, c) = wire::read_point(&buf[offset..])?;
    offset += c;
    let (cr, c) = wire::read_scalar(&buf[offset..])?;
    offset += c;
    let (d7, _) = wire::read_scalar(&buf[offset..])?;
    Ok(Smp4 { rb, cr, d7 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlv_roundtrip() {
        let tlv = Tlv {
            tlv_type: TlvType::SmpAbort,
            value: vec![],
        };
        let mut buf = Vec::new();
        tlv.serialize(&mut buf);
        let (decoded, consumed) = Tlv::deserialize(&buf).unwrap();
        assert_eq!(decoded.tlv_type, TlvType::SmpAbort);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn tlv_rejects_truncated_value() {
        let mut buf = Vec::new();
        wire::write_u16(&mut buf, 2);
        wire::write_u16(&mut buf, 10);
        buf.extend_from_slice(&[0u8; 3]);
        assert!(matches!(Tlv::deserialize(&buf), Err(ProtoError::Malformed(_))));
    }

    #[test]
    fn smp1_roundtrip_with_question() {
        use otr4_crypto::smp::context::SmpContext;
        let mut ctx = SmpContext::new();
        let msg1 = otr4_crypto::smp::proof::generate_msg1(&mut ctx, Some("color?".into()));
        let encoded = encode_smp1(&msg1);
        let decoded = decode_smp1(&encoded).unwrap();
        assert_eq!(decoded.question.as_deref(), Some("color?"));
        assert_eq!(decoded.g2a.to_bytes(), msg1.g2a.to_bytes());
    }

    #[test]
    fn smp1_roundtrip_without_question() {
        use otr4_crypto::smp::context::SmpContext;
        let mut ctx = SmpContext::new();
        let msg1 = otr4_crypto::smp::proof::generate_msg1(&mut ctx, None);
        let encoded = encode_smp1(&msg1);
        let decoded = decode_smp1(&encoded).unwrap();
        assert!(decoded.question.is_none());
    }
}
