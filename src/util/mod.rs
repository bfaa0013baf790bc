//! Poll and retry timing.

pub mod backoff;
pub mod retry;
