//! HTTP request handlers.

pub mod auth_handler;
pub mod user_handler;

pub use user_handler::user_routes;

use crate::domain::{IdCodec, User, UserResponse};
use crate::errors::AppResult;

/// Build the client-facing view of a user, encrypting its identifier.
pub(crate) fn present_user(user: User, codec: &IdCodec) -> AppResult<UserResponse> {
    let encoded_id = codec.encode(user.id)?;
    Ok(UserResponse::new(user, encoded_id))
}
