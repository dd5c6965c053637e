//! Reversible categorical encoding for annotated EHR tables.
//!
//! [`encode`] turns categorical variables into numeric blocks (one-hot,
//! label, count or hash encoding) and records everything needed to revert
//! the transformation in the table's [`EncodingHistory`](ehr_model::EncodingHistory).
//! [`decode`] restores the originals; encoding an already encoded table with
//! explicit assignments re-encodes it from the archived originals.

pub mod decode;
pub mod encode;
pub mod error;
pub mod multi;
mod obs;
pub mod plan;
pub mod strategies;

pub use decode::{DecodeScope, decode};
pub use encode::{DEFAULT_AUTODETECT_MODE, encode};
pub use error::{EncodeError, Result};
pub use multi::{decode_multi, encode_multi};
pub use plan::{EncodingPlan, EncodingSpec};
pub use strategies::{EncodedBlock, HASH_COMPONENTS, Strategy};
