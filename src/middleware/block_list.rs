//! Block-list gate (SPEC_FULL.md §4.12), grounded in the teacher's use of
//! `dashmap` for concurrent, lock-free-read shared state (cf.
//! `cache/memory.rs`). No HTTP route mutates this in v1 — see DESIGN.md
//! "block-list gate has no admin route yet".

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashSet;

use crate::state::AppState;

/// A concurrent set of blocked identifiers (IP address or user id),
/// checked before a handler runs.
#[derive(Default)]
pub struct BlockList {
    blocked: DashSet<String>,
}

impl BlockList {
    /// Builds an empty block-list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `identifier` is currently blocked.
    #[must_use]
    pub fn is_blocked(&self, identifier: &str) -> bool {
        self.blocked.contains(identifier)
    }

    /// Adds `identifier` to the block-list.
    pub fn block(&self, identifier: String) {
        self.blocked.insert(identifier);
    }

    /// Removes `identifier` from the block-list.
    pub fn unblock(&self, identifier: &str) {
        self.blocked.remove(identifier);
    }
}

/// Rejects a request before it reaches any handler if the peer address is
/// blocked. This is infrastructure, not a core outcome (spec §2 lists it
/// among "Middleware"), so it bypasses the response catalog entirely
/// rather than adding a new closed-set entry for it.
///
/// Connect info is only ever absent when the router is driven directly
/// (e.g. `tower::ServiceExt::oneshot` in tests) rather than served through
/// `into_make_service_with_connect_info`; in that case there is no peer
/// address to check against, so the gate simply lets the request through.
pub async fn gate(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ConnectInfo(addr)) = connect_info {
        if state.block_list.is_blocked(&addr.ip().to_string()) {
            return (StatusCode::FORBIDDEN, "blocked").into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_then_unblock() {
        let list = BlockList::new();
        assert!(!list.is_blocked("1.2.3.4"));
        list.block("1.2.3.4".to_string());
        assert!(list.is_blocked("1.2.3.4"));
        list.unblock("1.2.3.4");
        assert!(!list.is_blocked("1.2.3.4"));
    }
}
