//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `Idle -> Sending -> Idle`, one request in flight at most.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ConvContext, ConvState, LateReplyPolicy};
pub use transition::{transition, TransitionError};
