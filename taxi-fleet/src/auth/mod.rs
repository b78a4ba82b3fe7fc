//! Authentication: password hashing, sessions and request extractors
//!
//! Drivers log in with a username and password. The password is checked
//! against an Argon2id hash and the driver's id is stored in a server-side
//! session referenced by a cookie.

pub mod extractors;
pub mod password;
pub mod session;

pub use extractors::{Authenticated, AuthenticationError, Session, StaffUser};
pub use password::{verify_password, PasswordError, PasswordHashConfig, PasswordHasher};
pub use session::{FlashLevel, FlashMessage, SessionData, SessionError, SessionId, SessionStore};
