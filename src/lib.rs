//! AlphaBase Console - a client for the AlphaBase key/value backend
//!
//! The library holds everything the console does: the REST client, collection
//! discovery, the real-time channel and the view coordination that turns
//! server-pushed changes into reloads. The binary is a thin shell around
//! [`console::Console`].

pub mod adapters;
pub mod api;
pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod notifications;
pub mod realtime;
pub mod session;
pub mod summary;
pub mod traits;
pub mod view;
