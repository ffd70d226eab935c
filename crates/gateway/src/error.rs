// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gateway's error taxonomy. Every variant maps to exactly one
//! propagation outcome per the error-handling design: close the socket,
//! reject before registration, or escalate to the process supervisor.

use gateway_core::WsCloseCode;
use thiserror::Error;

use crate::types::Role;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("origin not allowed")]
    ForbiddenOrigin,

    #[error("role {0:?} is not permitted on this endpoint")]
    RoleNotAllowed(Role),

    #[error("event failed validation: {0}")]
    InvalidEvent(#[from] gateway_core::CoreError),

    #[error("global connection capacity exceeded")]
    CapacityExceeded,

    #[error("per-user connection capacity exceeded")]
    PerUserCapacityExceeded,

    #[error("message rate limit exceeded")]
    RateLimited,

    #[error("message too large: {0} bytes")]
    MessageTooBig(usize),

    #[error("binary frames are not supported")]
    UnsupportedData,

    #[error("deadlock risk: attempted to acquire {attempted} while holding order {held}")]
    LockOrderViolation { attempted: &'static str, held: &'static str },

    #[error("circuit breaker '{0}' is open")]
    CircuitOpen(&'static str),

    #[error("bus subscriber exhausted reconnect attempts")]
    ReconnectExhausted,

    #[error("upstream bus error: {0}")]
    Bus(#[from] async_nats::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Close code to send the client, when this error ends a connection.
    pub fn close_code(&self) -> WsCloseCode {
        match self {
            GatewayError::AuthFailed(_) => WsCloseCode::AuthFailed,
            GatewayError::ForbiddenOrigin | GatewayError::RoleNotAllowed(_) => WsCloseCode::Forbidden,
            GatewayError::CapacityExceeded | GatewayError::PerUserCapacityExceeded => {
                WsCloseCode::ServerOverloaded
            }
            GatewayError::RateLimited => WsCloseCode::RateLimited,
            GatewayError::MessageTooBig(_) => WsCloseCode::MessageTooBig,
            GatewayError::UnsupportedData => WsCloseCode::UnsupportedData,
            GatewayError::InvalidEvent(_) => WsCloseCode::PolicyViolation,
            _ => WsCloseCode::ServerError,
        }
    }
}
