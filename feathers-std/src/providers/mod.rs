//! Standard transports.

#[cfg(feature = "rest")]
pub mod rest;
pub mod socket;
#[cfg(feature = "tower")]
pub mod tower;
