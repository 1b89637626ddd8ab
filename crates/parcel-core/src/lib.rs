//! Core types shared by the Parcel engine and its hosts.

pub mod core;

pub use core::error::{ErrorKind, ParcelError, ParcelResult};
pub use core::version::Version;
