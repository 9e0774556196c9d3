//! Backend access: the HTTP adapter, wire types, and per-resource gateways.
//!
//! Gateways are thin: one method per backend operation, typed request and
//! reply, no caching. State that outlives a call lives in `crate::state`.

pub mod api;
pub mod api_admin;
pub mod api_knowledge;
pub mod api_ops;
pub mod http;
pub mod types;

use types::RecordId;

/// `{collection}{id}/` for a DRF detail route.
pub(crate) fn detail_path(collection: &str, id: RecordId) -> String {
    format!("{collection}{id}/")
}

/// `{collection}{id}/{action}/` for a DRF detail action.
pub(crate) fn detail_action_path(collection: &str, id: RecordId, action: &str) -> String {
    format!("{collection}{id}/{action}/")
}

/// `{collection}{action}/` for a DRF list action.
pub(crate) fn list_action_path(collection: &str, action: &str) -> String {
    format!("{collection}{action}/")
}
