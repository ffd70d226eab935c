// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sign(secret: &[u8], payload: &TablePayload) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let payload_json = serde_json::to_vec(&serde_json::json!({
        "tenant_id": payload.tenant_id,
        "branch_id": payload.branch_id,
        "table_id": payload.table_id,
        "session_id": payload.session_id,
    }))
    .unwrap();
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let signature = hmac::sign(&key, &payload_json);
    format!("{}.{}", engine.encode(&payload_json), engine.encode(signature.as_ref()))
}

#[test]
fn valid_token_authenticates_as_diner() {
    let secret = b"table-secret";
    let token = sign(
        secret,
        &TablePayload { tenant_id: 1, branch_id: 2, table_id: 3, session_id: 4 },
    );
    let strategy = TableTokenStrategy::new("table-secret".to_string());
    let identity = strategy.authenticate(&format!("table_token={token}")).unwrap().unwrap();
    assert_eq!(identity.role, Role::Diner);
    assert_eq!(identity.session_id, Some(4));
    assert_eq!(identity.user_id, Some(-4));
}

#[test]
fn tampered_signature_is_rejected() {
    let secret = b"table-secret";
    let token = sign(
        secret,
        &TablePayload { tenant_id: 1, branch_id: 2, table_id: 3, session_id: 4 },
    );
    let mut tampered = token.clone();
    tampered.push('x');
    let strategy = TableTokenStrategy::new("table-secret".to_string());
    assert!(strategy.authenticate(&format!("table_token={tampered}")).is_err());
}
