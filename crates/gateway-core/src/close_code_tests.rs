// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn codes_match_the_documented_contract() {
    assert_eq!(WsCloseCode::Normal.code(), 1000);
    assert_eq!(WsCloseCode::GoingAway.code(), 1001);
    assert_eq!(WsCloseCode::ProtocolError.code(), 1002);
    assert_eq!(WsCloseCode::UnsupportedData.code(), 1003);
    assert_eq!(WsCloseCode::PolicyViolation.code(), 1008);
    assert_eq!(WsCloseCode::MessageTooBig.code(), 1009);
    assert_eq!(WsCloseCode::ServerError.code(), 1011);
    assert_eq!(WsCloseCode::ServerOverloaded.code(), 1013);
    assert_eq!(WsCloseCode::AuthFailed.code(), 4001);
    assert_eq!(WsCloseCode::Forbidden.code(), 4003);
    assert_eq!(WsCloseCode::RateLimited.code(), 4029);
}
