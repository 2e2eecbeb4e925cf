//! # Checkout
//!
//! State machines behind the pledge sheet: reward carousel, add-on picker,
//! page flow, and the paged comment thread shown beside them.
//!
//! The view models are plain single-writer structs. [`session`] wraps the
//! three pledge view models in one background task so hosts only send
//! intents and read snapshots.

pub mod add_ons;
pub mod button_state;
pub mod checkout_flow;
pub mod collaborators;
pub mod comments;
pub mod config;
pub mod errors;
pub mod events;
pub mod fixtures;
pub mod rewards_selection;
pub mod session;
pub mod shipping;

#[cfg(test)]
mod test_session;

pub use errors::{CheckoutError, Result};
pub use session::{spawn, Intent, SessionHandle};
