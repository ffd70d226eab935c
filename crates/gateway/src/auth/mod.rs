// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy-pattern authentication: waiter/kitchen/admin connections carry
//! a JWT, diner connections carry an opaque table token. Each role endpoint
//! invokes its own strategy directly and enforces its own required roles,
//! since the two credential kinds are never interchangeable for a given
//! route.

pub mod jwt;
pub mod table_token;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::Identity;

pub trait AuthStrategy: Send + Sync {
    /// Attempts to authenticate from the WebSocket upgrade query string.
    /// Returns `Ok(None)` (not `Err`) when this strategy simply doesn't
    /// apply to the given credential, so the composite can fall through to
    /// the next one.
    fn authenticate(&self, query: &str) -> Result<Option<Identity>, GatewayError>;
}

pub struct Authenticator {
    pub jwt: jwt::JwtStrategy,
    pub table_token: table_token::TableTokenStrategy,
}

impl Authenticator {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            jwt: jwt::JwtStrategy::new(config.jwt_secret.clone()),
            table_token: table_token::TableTokenStrategy::new(config.table_token_secret.clone()),
        }
    }
}

/// Pulls a single `key=value` pair out of a raw WS query string.
pub(crate) fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| pair.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
}
