// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-dimensional connection index: forward maps from (tenant, branch,
//! sector, session, role) to connection ids, plus the reverse map needed to
//! remove a connection from every forward map it appears in during
//! disconnect.
//!
//! `recipients` takes its internal lock exactly once per call so that the
//! membership snapshot it returns can never straddle a concurrent
//! registration — materializing the list and filtering it by tenant happen
//! under the same guard.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::types::{ConnectionId, Identity, Role};

#[derive(Default)]
struct IndexData {
    by_user: HashMap<i64, HashSet<ConnectionId>>,
    by_branch_waiters: HashMap<i64, HashSet<ConnectionId>>,
    by_branch_kitchen: HashMap<i64, HashSet<ConnectionId>>,
    by_branch_admin: HashMap<i64, HashSet<ConnectionId>>,
    by_sector: HashMap<i64, HashSet<ConnectionId>>,
    by_session: HashMap<i64, HashSet<ConnectionId>>,
    /// Reverse map: connection id -> everywhere it was registered, plus its
    /// tenant, so a disconnect can undo registration without re-deriving
    /// membership from the identity.
    reverse: HashMap<ConnectionId, (i64, Identity)>,
}

pub struct ConnectionIndex {
    data: RwLock<IndexData>,
}

impl Default for ConnectionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionIndex {
    pub fn new() -> Self {
        Self { data: RwLock::new(IndexData::default()) }
    }

    pub async fn register(&self, conn_id: ConnectionId, identity: Identity) {
        let mut data = self.data.write().await;
        let tenant_id = identity.tenant_id;

        if let Some(user_id) = identity.user_id {
            data.by_user.entry(user_id).or_default().insert(conn_id);
        }
        if let Some(branch_id) = identity.branch_id {
            let map = match identity.role {
                Role::Waiter => &mut data.by_branch_waiters,
                Role::Kitchen => &mut data.by_branch_kitchen,
                Role::Admin => &mut data.by_branch_admin,
                Role::Diner => &mut data.by_branch_waiters,
            };
            map.entry(branch_id).or_default().insert(conn_id);
        }
        for sector_id in &identity.sector_ids {
            data.by_sector.entry(*sector_id).or_default().insert(conn_id);
        }
        if let Some(session_id) = identity.session_id {
            data.by_session.entry(session_id).or_default().insert(conn_id);
        }
        data.reverse.insert(conn_id, (tenant_id, identity));
    }

    pub async fn unregister(&self, conn_id: ConnectionId) {
        let mut data = self.data.write().await;
        let Some((_, identity)) = data.reverse.remove(&conn_id) else { return };

        if let Some(user_id) = identity.user_id {
            Self::remove_from(&mut data.by_user, &user_id, conn_id);
        }
        if let Some(branch_id) = identity.branch_id {
            match identity.role {
                Role::Waiter | Role::Diner => Self::remove_from(&mut data.by_branch_waiters, &branch_id, conn_id),
                Role::Kitchen => Self::remove_from(&mut data.by_branch_kitchen, &branch_id, conn_id),
                Role::Admin => Self::remove_from(&mut data.by_branch_admin, &branch_id, conn_id),
            }
        }
        for sector_id in &identity.sector_ids {
            Self::remove_from(&mut data.by_sector, sector_id, conn_id);
        }
        if let Some(session_id) = identity.session_id {
            Self::remove_from(&mut data.by_session, &session_id, conn_id);
        }
    }

    fn remove_from<K: std::hash::Hash + Eq>(map: &mut HashMap<K, HashSet<ConnectionId>>, key: &K, conn_id: ConnectionId) {
        if let Some(set) = map.get_mut(key) {
            set.remove(&conn_id);
            if set.is_empty() {
                map.remove(key);
            }
        }
    }

    /// Materializes the recipient set for a routing decision and filters it
    /// by tenant in the same read-lock acquisition, so a connection that
    /// switches tenant mid-broadcast can never leak across the boundary.
    #[allow(clippy::too_many_arguments)]
    pub async fn recipients(
        &self,
        tenant_id: i64,
        branch_id: Option<i64>,
        sector_ids: &[i64],
        session_id: Option<i64>,
        want_waiters: bool,
        want_kitchen: bool,
        want_admin: bool,
        want_session: bool,
    ) -> Vec<ConnectionId> {
        let data = self.data.read().await;
        let mut out: HashSet<ConnectionId> = HashSet::new();

        if want_waiters {
            if !sector_ids.is_empty() {
                for sector_id in sector_ids {
                    if let Some(set) = data.by_sector.get(sector_id) {
                        out.extend(set.iter().copied());
                    }
                }
            } else if let Some(branch_id) = branch_id {
                if let Some(set) = data.by_branch_waiters.get(&branch_id) {
                    out.extend(set.iter().copied());
                }
            }
        }
        if want_kitchen {
            if let Some(branch_id) = branch_id {
                if let Some(set) = data.by_branch_kitchen.get(&branch_id) {
                    out.extend(set.iter().copied());
                }
            }
        }
        if want_admin {
            if let Some(branch_id) = branch_id {
                if let Some(set) = data.by_branch_admin.get(&branch_id) {
                    out.extend(set.iter().copied());
                }
            }
        }
        if want_session {
            if let Some(session_id) = session_id {
                if let Some(set) = data.by_session.get(&session_id) {
                    out.extend(set.iter().copied());
                }
            }
        }

        out.into_iter()
            .filter(|conn_id| data.reverse.get(conn_id).map(|(t, _)| *t == tenant_id).unwrap_or(false))
            .collect()
    }

    pub async fn connections_for_user(&self, user_id: i64) -> Vec<ConnectionId> {
        let data = self.data.read().await;
        data.by_user.get(&user_id).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.reverse.len()
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
