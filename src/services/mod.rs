//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence so route handlers stay
//! focused on extraction, permission checks, and status mapping. Every
//! tenant-owned operation takes the tenant id explicitly; services never read
//! request headers.

pub mod auth;
pub mod cadastros;
pub mod contabil;
pub mod financeiro;
pub mod okr;
pub mod session;
pub mod tenant;
