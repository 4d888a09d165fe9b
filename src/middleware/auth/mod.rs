//! Two independent stages, composed in this order:
//! - `access`: resolves a bearer token into an `AuthCtx` (never rejects)
//! - `guard`: requires an `AuthCtx` on protected routes (always rejects without one)
pub mod access;
pub mod guard;
pub mod public;
