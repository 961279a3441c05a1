//! Terminal studio for the Pipio avatar-video services.
//!
//! `core::bridge` is the single path to the network; everything above it
//! (typed clients, the session, the terminal front end) consumes its
//! classified results.

pub mod core;
pub mod logging;
pub mod platform;

pub use crate::core::bridge::{ApiBridge, BridgeError, CallResult, Credential, Method};
pub use crate::core::session::{Session, SessionError};
