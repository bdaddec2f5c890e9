mod admin;
mod listing;
mod mutation;
mod notify;
mod static_files;

use crate::api::response::ApiError;

pub use admin::health;
pub use listing::storage_list;
pub use mutation::{storage_mutation, MutationRequest, Operation};
pub use notify::{notify_access, NotifyRequest};
pub use static_files::serve_object;

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
