//! Per-session SMP state (§4.F): the state enum, progress counter, the
//! hashed common secret, and the scalars/points carried between messages.

use crate::error::{Otr4Error, Result};
use crate::hash::{hash_to_scalar, hash_with_prefix};
use crate::primitives::{Point, Scalar};

use super::proof::Smp1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SmpState {
    Expect1,
    Expect2,
    Expect3,
    Expect4,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SmpEvent {
    None,
    AskForAnswer,
    Success,
    Failure,
    Error,
    Abort,
}

pub struct SmpContext {
    pub state: SmpState,
    pub progress: u8,

    pub(crate) secret: Option<[u8; 64]>,

    pub(crate) a2: Option<Scalar>,
    pub(crate) a3: Option<Scalar>,
    pub(crate) b3: Option<Scalar>,

    pub(crate) g2: Option<Point>,
    pub(crate) g3: Option<Point>,
    pub(crate) g3a: Option<Point>,
    pub(crate) g3b: Option<Point>,

    pub(crate) pb: Option<Point>,
    pub(crate) qb: Option<Point>,
    pub(crate) pa_pb: Option<Point>,
    pub(crate) qa_qb: Option<Point>,

    pub(crate) msg1: Option<Smp1>,
}

impl SmpContext {
    /// Fresh, `EXPECT1`, `progress = 0`.
    pub fn new() -> Self {
        SmpContext {
            state: SmpState::Expect1,
            progress: 0,
            secret: None,
            a2: None,
            a3: None,
            b3: None,
            g2: None,
            g3: None,
            g3a: None,
            g3b: None,
            pb: None,
            qb: None,
            pa_pb: None,
            qa_qb: None,
            msg1: None,
        }
    }

    /// `secret <- H("OTR4-SMP-v1" ∥ our_fp ∥ their_fp ∥ ssid ∥ answer)`.
    pub fn set_secret(&mut self, our_fp: &[u8; 56], their_fp: &[u8; 56], ssid: &[u8; 8], answer: &str) {
        let mut preimage = Vec::with_capacity(1 + 56 + 56 + 8 + answer.len());
        preimage.push(0x01);
        preimage.extend_from_slice(our_fp);
        preimage.extend_from_slice(their_fp);
        preimage.extend_from_slice(ssid);
        preimage.extend_from_slice(answer.as_bytes());
        let mut out = [0u8; 64];
        hash_with_prefix(b"OTR4-SMP-v1", &preimage, &mut out);
        self.secret = Some(out);
    }

    pub(crate) fn secret_scalar(&self) -> Result<Scalar> {
        let secret = self
            .secret
            .ok_or_else(|| Otr4Error::StateViolation("SMP secret not seeded".into()))?;
        Ok(hash_to_scalar(&secret))
    }

    /// Reset to a fresh `EXPECT1` context, dropping every intermediate
    /// scalar and point.
    pub fn reset(&mut self) {
        *self = SmpContext::new();
    }
}

impl Default for SmpContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_deterministic() {
        let mut a = SmpContext::new();
        let mut b = SmpContext::new();
        let fp = [0u8; 56];
        let ssid = [0u8; 8];
        a.set_secret(&fp, &fp, &ssid, "answer");
        b.set_secret(&fp, &fp, &ssid, "answer");
        assert_eq!(a.secret, b.secret);
    }

    #[test]
    fn different_answers_give_different_secrets() {
        let mut a = SmpContext::new();
        let mut b = SmpContext::new();
        let fp = [0u8; 56];
        let ssid = [0u8; 8];
        a.set_secret(&fp, &fp, &ssid, "answer");
        b.set_secret(&fp, &fp, &ssid, "wrong");
        assert_ne!(a.secret, b.secret);
    }
}
