//! Grapheme cluster segmentation (UAX #29), canonical/compatibility caseless
//! matching (UAX #44), and monospace display width (UAX #11), all built on
//! code-generated Unicode property tables (see `build.rs`).

pub mod case;
pub mod cp_iter;
pub mod error;
mod fix;
mod helpers;
pub mod normalise;
pub mod segmentation;
pub(crate) mod ucd;
mod validate;
pub mod width;

pub use error::UnicodeCoreError;
pub use fix::fix;
pub use validate::validate;
