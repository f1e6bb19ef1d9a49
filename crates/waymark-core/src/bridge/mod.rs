//! Unix-socket bridge exposing the facade to external agents.
//!
//! The bridge runs *inside* the embedding UI process: the application
//! builds a facade, hands it to [`server::AutomationServer`], and agents
//! (the `waymark` CLI, test harnesses) connect to the per-app socket.

pub mod paths;
pub mod server;

pub use server::AutomationServer;
