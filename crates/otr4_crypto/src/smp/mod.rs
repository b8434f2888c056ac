//! The Socialist Millionaires' Protocol: context (§4.F), proof engine and
//! message data model (§4.G).

pub mod context;
pub mod proof;
pub mod state_machine;

pub use context::{SmpContext, SmpEvent, SmpState};
pub use proof::{Smp1, Smp2, Smp3, Smp4};
