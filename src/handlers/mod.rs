// handlers/mod.rs - HTTP handlers grouped by resource
//
// Every handler follows the same order: the principal is resolved by
// middleware, then the target is located (ids parsed before any storage
// call), then ownership is checked, then the mutation runs.

pub mod comments;
pub mod health;
pub mod likes;
pub mod multipart;
pub mod playlists;
pub mod subscriptions;
pub mod users;
pub mod videos;
