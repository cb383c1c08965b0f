//! Messenger-facing types and the outbound notification port.

pub mod port;
pub mod throttled;
pub mod types;
