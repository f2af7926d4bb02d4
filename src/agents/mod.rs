//! The periodic vendor and customer tasks.
//!
//! Both agents follow the same shape: a validated constructor, a `spawn()`
//! that moves the agent into a tokio task, and an attempt-then-sleep loop
//! whose sleep is interruptible by a broadcast shutdown signal.

mod customer;
mod vendor;

pub use customer::Customer;
pub use vendor::Vendor;
