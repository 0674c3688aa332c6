//! Authentication module for Chirpy
//!
//! Stateless access tokens (HS256 JWTs) authorize ordinary requests;
//! opaque refresh tokens stored in the database mint new access tokens
//! until they expire or are revoked.

pub mod guard;
pub mod handlers;
pub mod password;
pub mod service;
pub mod token;

pub use guard::AuthenticatedUser;
pub use service::{AuthService, Session};
pub use token::{Claims, TokenService};
