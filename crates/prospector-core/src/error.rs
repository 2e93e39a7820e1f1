use alloy_primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProspectorError {
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar { name: String, value: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Call decode error for {address}: {message}")]
    CallDecode { address: Address, message: String },
}

pub type Result<T> = std::result::Result<T, ProspectorError>;
