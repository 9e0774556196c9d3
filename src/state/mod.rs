//! Client-side state: the session store, the durable store behind it, and the
//! cached resource catalog.

pub mod auth;
pub mod catalog;
pub mod storage;
