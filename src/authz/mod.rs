//! Request authorization and resource ownership.
//!
//! A mutating request runs: resolve principal, locate target, check
//! ownership, mutate. Listings go through the paginator.

pub mod error;
pub mod locator;
pub mod ownership;
pub mod pagination;
pub mod principal;
pub mod toggle;
pub mod verifier;
pub mod visibility;

pub use error::{AuthzError, AuthzResult};
pub use locator::{locate, locate_by_id, parse_id, Locate, ResourceKind};
pub use ownership::{locate_owned, OwnedResource};
pub use pagination::{cap_raw_limit, PageRequest};
pub use principal::Principal;
pub use toggle::{active_among, count_active, count_active_many, is_active, toggle, ToggleState};
pub use verifier::resolve_principal;
pub use visibility::{
    is_visible, locate_visible_comment, locate_visible_comment_by_id, locate_visible_video, locate_visible_video_by_id,
};
