//! Checkout-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shipping rules error: {0}")]
    ShippingRules(String),

    #[error("Comments error: {0}")]
    Comments(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkout session has shut down")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
