// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::{query_param, AuthStrategy};
use crate::error::GatewayError;
use crate::types::{Identity, Role};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: i64,
    role: String,
    tenant_id: i64,
    branch_id: Option<i64>,
    #[serde(default)]
    sector_ids: Vec<i64>,
}

/// Authenticates waiter, kitchen, and admin connections via an HS256 JWT
/// passed as `?jwt=...` on the WebSocket upgrade. A connection carrying
/// this token is revalidated on the configured interval, not just once at
/// accept time, since a token can be revoked mid-session.
pub struct JwtStrategy {
    secret: String,
}

impl JwtStrategy {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn revalidate(&self, token: &str) -> Result<(), GatewayError> {
        self.decode(token).map(|_| ())
    }

    fn decode(&self, token: &str) -> Result<Claims, GatewayError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| GatewayError::AuthFailed(format!("invalid jwt: {e}")))
    }
}

impl AuthStrategy for JwtStrategy {
    fn authenticate(&self, query: &str) -> Result<Option<Identity>, GatewayError> {
        let Some(token) = query_param(query, "jwt") else { return Ok(None) };
        let claims = self.decode(token)?;
        let role = match claims.role.as_str() {
            "waiter" => Role::Waiter,
            "kitchen" => Role::Kitchen,
            "admin" => Role::Admin,
            other => return Err(GatewayError::AuthFailed(format!("unrecognized role `{other}`"))),
        };
        Ok(Some(Identity {
            role,
            tenant_id: claims.tenant_id,
            user_id: Some(claims.sub),
            branch_id: claims.branch_id,
            sector_ids: claims.sector_ids,
            session_id: None,
        }))
    }
}
