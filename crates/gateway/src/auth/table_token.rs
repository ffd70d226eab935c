// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::Engine;
use ring::hmac;
use serde::Deserialize;

use super::{query_param, AuthStrategy};
use crate::error::GatewayError;
use crate::types::{Identity, Role};

#[derive(Debug, Deserialize)]
struct TablePayload {
    tenant_id: i64,
    branch_id: i64,
    table_id: i64,
    session_id: i64,
}

/// Authenticates diner connections via an opaque table token: a
/// base64url-encoded JSON payload plus an HMAC-SHA256 signature, both
/// base64url-encoded and joined with a `.`, passed as `?table_token=...`.
/// Unlike the JWT strategy this never expires on its own — a table
/// session's lifetime is whatever closes the session, not a token `exp`.
pub struct TableTokenStrategy {
    secret: Vec<u8>,
}

impl TableTokenStrategy {
    pub fn new(secret: String) -> Self {
        Self { secret: secret.into_bytes() }
    }
}

impl AuthStrategy for TableTokenStrategy {
    fn authenticate(&self, query: &str) -> Result<Option<Identity>, GatewayError> {
        let Some(token) = query_param(query, "table_token") else { return Ok(None) };
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| GatewayError::AuthFailed("malformed table token".into()))?;

        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let payload_bytes = engine
            .decode(payload_b64)
            .map_err(|_| GatewayError::AuthFailed("malformed table token payload".into()))?;
        let signature = engine
            .decode(signature_b64)
            .map_err(|_| GatewayError::AuthFailed("malformed table token signature".into()))?;

        let key = hmac::Key::new(hmac::HMAC_SHA256, &self.secret);
        hmac::verify(&key, &payload_bytes, &signature)
            .map_err(|_| GatewayError::AuthFailed("table token signature mismatch".into()))?;

        let payload: TablePayload = serde_json::from_slice(&payload_bytes)
            .map_err(|_| GatewayError::AuthFailed("malformed table token payload".into()))?;

        Ok(Some(Identity {
            role: Role::Diner,
            tenant_id: payload.tenant_id,
            // Diners have no user account; a negative pseudo-id keyed off
            // the session lets the index track them like any other user
            // without colliding with real (positive) user ids.
            user_id: Some(-payload.session_id),
            branch_id: Some(payload.branch_id),
            sector_ids: Vec::new(),
            session_id: Some(payload.session_id),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "table_token_tests.rs"]
mod tests;
