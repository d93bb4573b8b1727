//! `wholesale-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: tokens come in as strings, principals and
//! permission decisions come out. Also home to the `User` account record and
//! its password hashing.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, CommandAuthorization, authorize, authorize_all};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use user::{NewUser, User, UserPatch, UserProfile};
