//! Swap event signatures for the supported AMM protocol families.
//!
//! Only `SIGNATURE_HASH` is consumed at runtime: pool recognition matches
//! `topics[0]` against these hashes and never decodes the event body.

pub mod v1;
pub mod v2;
pub mod v3;
pub mod v4;
