mod payment;
mod share;
mod user;
mod worker;

pub use payment::*;
pub use share::*;
pub use user::*;
pub use worker::*;

/// Seconds since the unix epoch.
pub type Timestamp = u64;
