//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace layer)
//!     → proxy middleware #1 → #2 → ... (first match takes ownership)
//!     → 404 fallback
//! ```

pub mod server;

pub use server::DevServer;
