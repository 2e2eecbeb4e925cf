//! # Pledge domain
//!
//! Domain model of the crowdfunding client and the pure transformation layer
//! that turns GraphQL response fragments into it.
//!
//! | Concern          | Module                 |
//! |------------------|------------------------|
//! | Wire shapes      | [`fragments`]          |
//! | Domain model     | [`types`]              |
//! | Relay ids        | [`relay`]              |
//! | Fragment → model | [`transformers`]       |
//! | Reward rules     | [`reward_utils`]       |
//! | Mutation inputs  | [`mutations`]          |
//!
//! ## Failure semantics
//!
//! Nothing in this crate returns an error to its caller. A missing fragment
//! produces a default entity and a malformed field degrades to its default
//! (`0.0`, `-1`, `None`), so a drifting API blanks a field instead of
//! aborting a whole screen.

pub mod fragments;
pub mod mutations;
pub mod relay;
pub mod reward_utils;
pub mod transformers;
pub mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_transformers;

pub use relay::{decode_relay_id, encode_relay_id, Relay};
pub use types::*;
