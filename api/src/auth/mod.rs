//! Credentials and bearer tokens.
//!
//! `password` hashes and verifies user passwords, `token` issues and checks
//! signed access tokens, and `guard` turns an inbound request into a caller
//! identity for the protected routes.

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{authenticate, authorize_ownership, AuthUser};
pub use token::{Claims, TokenService};
