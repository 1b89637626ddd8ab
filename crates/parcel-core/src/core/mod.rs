pub mod error;
pub mod path;
pub mod version;

pub use error::{ErrorKind, ParcelError, ParcelResult};
pub use version::Version;
