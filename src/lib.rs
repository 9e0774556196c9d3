//! Native client for the admin console backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owns what the browser console kept client-side: the signed-in session and
//! its durable snapshot, the route table and its guard, the global 401
//! handling, and typed gateways for every backend resource. The `admin-cli`
//! binary is a thin front end over [`app::Console`].

pub mod app;
pub mod config;
pub mod net;
pub mod router;
pub mod state;
pub mod util;

pub use app::{Console, ConsoleError};
pub use config::ConsoleConfig;
