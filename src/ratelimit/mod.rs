//! Per-caller request governor shared by the AI endpoints.

pub mod client;
pub mod clock;
mod governor;

pub use client::{client_ip, rate_key, ASK_CAPABILITY, INDEX_CAPABILITY};
pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub(crate) use clock::ManualClock;
pub use governor::{spawn_sweeper, RateDecision, RateGovernor};
