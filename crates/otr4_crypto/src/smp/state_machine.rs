//! The outer SMP state machine (§4.G table), dispatching the message
//! generation/verification functions in [`super::proof`] and driving
//! [`SmpContext`] through its state transitions.
//!
//! Restructured from the original C's table of `static` handler functions
//! into explicit methods returning an [`SmpEvent`], the same "pure function
//! returns an event enum" shape the teacher uses internally for
//! `RatchetSession::decrypt_step`'s dispatch on whether a DH ratchet step is
//! required.

use crate::error::{Otr4Error, Result};

use super::context::{SmpContext, SmpEvent, SmpState};
use super::proof::{self, Smp1, Smp2, Smp3, Smp4};

impl SmpContext {
    /// `EXPECT1 -> EXPECT2`: initiate with our answer already known.
    pub fn initiate(
        &mut self,
        our_fp: &[u8; 56],
        their_fp: &[u8; 56],
        ssid: &[u8; 8],
        answer: &str,
        question: Option<String>,
    ) -> Result<Smp1> {
        if self.state != SmpState::Expect1 {
            return Err(Otr4Error::StateViolation("SMP already in progress".into()));
        }
        self.set_secret(our_fp, their_fp, ssid, answer);
        let msg1 = proof::generate_msg1(self, question);
        self.state = SmpState::Expect2;
        self.progress = 25;
        Ok(msg1)
    }

    /// `EXPECT1 -> EXPECT1`: received the peer's opening message; the
    /// embedder must prompt the user for an answer before calling
    /// [`Self::respond`]. Any other unsolicited arrival aborts.
    pub fn receive_msg1(&mut self, msg1: Smp1) -> SmpEvent {
        if self.state != SmpState::Expect1 {
            self.reset();
            return SmpEvent::Abort;
        }
        if proof::validate_msg1(&msg1).is_err() {
            self.reset();
            return SmpEvent::Error;
        }
        self.msg1 = Some(msg1);
        SmpEvent::AskForAnswer
    }

    /// `EXPECT1 -> EXPECT3`: respond to a cached msg1 with our answer.
    pub fn respond(
        &mut self,
        our_fp: &[u8; 56],
        their_fp: &[u8; 56],
        ssid: &[u8; 8],
        answer: &str,
    ) -> Result<Smp2> {
        let msg1 = self
            .msg1
            .take()
            .ok_or_else(|| Otr4Error::StateViolation("no pending msg1 to respond to".into()))?;
        self.set_secret(our_fp, their_fp, ssid, answer);
        match proof::generate_msg2(self, &msg1) {
            Ok(msg2) => {
                self.state = SmpState::Expect3;
                self.progress = 50;
                Ok(msg2)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// `EXPECT2 -> EXPECT4`: verify msg2 and emit msg3.
    pub fn receive_msg2(&mut self, msg2: Smp2) -> Result<Smp3> {
        if self.state != SmpState::Expect2 {
            self.reset();
            return Err(Otr4Error::StateViolation("msg2 not expected".into()));
        }
        match proof::generate_msg3(self, &msg2) {
            Ok(msg3) => {
                self.state = SmpState::Expect4;
                self.progress = 75;
                Ok(msg3)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// `EXPECT3 -> EXPECT1`: verify msg3, emit msg4 and the verdict.
    pub fn receive_msg3(&mut self, msg3: Smp3) -> Result<(Smp4, SmpEvent)> {
        if self.state != SmpState::Expect3 {
            self.reset();
            return Err(Otr4Error::StateViolation("msg3 not expected".into()));
        }
        match proof::validate_msg3_and_generate_msg4(self, &msg3) {
            Ok((msg4, success)) => {
                self.reset();
                Ok((msg4, if success { SmpEvent::Success } else { SmpEvent::Failure }))
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// `EXPECT4 -> EXPECT1`: verify msg4 and emit the final verdict.
    pub fn receive_msg4(&mut self, msg4: Smp4) -> Result<SmpEvent> {
        if self.state != SmpState::Expect4 {
            self.reset();
            return Err(Otr4Error::StateViolation("msg4 not expected".into()));
        }
        let result = proof::validate_msg4(self, &msg4);
        self.reset();
        match result {
            Ok(true) => Ok(SmpEvent::Success),
            Ok(false) => Ok(SmpEvent::Failure),
            Err(e) => Err(e),
        }
    }

    /// Immediate, synchronous user abort: reset to `EXPECT1`.
    pub fn abort(&mut self) -> SmpEvent {
        self.reset();
        SmpEvent::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(byte: u8) -> [u8; 56] {
        [byte; 56]
    }

    #[test]
    fn happy_path_both_sides_succeed() {
        let mut alice = SmpContext::new();
        let mut bob = SmpContext::new();
        let ssid = [0u8; 8];
        let alice_fp = fp(1);
        let bob_fp = fp(2);

        let msg1 = alice.initiate(&alice_fp, &bob_fp, &ssid, "answer", None).unwrap();
        assert_eq!(bob.receive_msg1(msg1), SmpEvent::AskForAnswer);

        let msg2 = bob.respond(&bob_fp, &alice_fp, &ssid, "answer").unwrap();
        let msg3 = alice.receive_msg2(msg2).unwrap();
        let (msg4, bob_event) = bob.receive_msg3(msg3).unwrap();
        assert_eq!(bob_event, SmpEvent::Success);
        assert_eq!(bob.state, SmpState::Expect1);
        assert_eq!(bob.progress, 0);

        let alice_event = alice.receive_msg4(msg4).unwrap();
        assert_eq!(alice_event, SmpEvent::Success);
        assert_eq!(alice.state, SmpState::Expect1);
    }

    #[test]
    fn mismatched_answers_fail_without_proof_errors() {
        let mut alice = SmpContext::new();
        let mut bob = SmpContext::new();
        let ssid = [0u8; 8];
        let alice_fp = fp(1);
        let bob_fp = fp(2);

        let msg1 = alice.initiate(&alice_fp, &bob_fp, &ssid, "answer", None).unwrap();
        bob.receive_msg1(msg1);
        let msg2 = bob.respond(&bob_fp, &alice_fp, &ssid, "wrong").unwrap();
        let msg3 = alice.receive_msg2(msg2).unwrap();
        let (msg4, bob_event) = bob.receive_msg3(msg3).unwrap();
        assert_eq!(bob_event, SmpEvent::Failure);

        let alice_event = alice.receive_msg4(msg4).unwrap();
        assert_eq!(alice_event, SmpEvent::Failure);
    }

    #[test]
    fn msg3_in_expect1_is_a_state_violation() {
        let mut bob = SmpContext::new();
        let alice_fp = fp(1);
        let bob_fp = fp(2);
        let ssid = [0u8; 8];
        let mut alice = SmpContext::new();
        let msg1 = alice.initiate(&alice_fp, &bob_fp, &ssid, "answer", None).unwrap();
        bob.receive_msg1(msg1);
        let msg2 = bob.respond(&bob_fp, &alice_fp, &ssid, "answer").unwrap();
        let msg3 = alice.receive_msg2(msg2).unwrap();

        // Bob is in EXPECT3, not EXPECT1; feeding msg3 back into a fresh
        // context must be rejected rather than silently accepted.
        let mut stray = SmpContext::new();
        assert!(matches!(
            stray.receive_msg3(msg3),
            Err(Otr4Error::StateViolation(_))
        ));
    }
}
