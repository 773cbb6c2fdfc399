//! Domain layer - Core business entities and value objects
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.

pub mod encoded_id;
pub mod password;
pub mod user;

pub use encoded_id::IdCodec;
pub use password::Password;
pub use user::{NewUser, UpdateProfile, User, UserChanges, UserResponse};
