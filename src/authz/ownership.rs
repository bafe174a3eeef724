use uuid::Uuid;

use super::error::{AuthzError, AuthzResult};
use super::locator::{locate, Locate};
use super::principal::Principal;
use crate::database::models::{Comment, Playlist, Video};
use crate::database::Store;

/// An entity with exactly one owner, fixed at creation.
///
/// Ownership is the only authorization axis: a principal may mutate a
/// resource iff it owns it.
pub trait OwnedResource: Locate {
    fn owner_id(&self) -> Uuid;

    fn is_owned_by(&self, principal: &Principal) -> bool {
        self.owner_id() == principal.id
    }

    fn ensure_owner(&self, principal: &Principal) -> AuthzResult<()> {
        if self.is_owned_by(principal) {
            Ok(())
        } else {
            tracing::warn!(
                "Ownership check failed: {} owned by {}, requested by {}",
                Self::KIND,
                self.owner_id(),
                principal.id
            );
            Err(AuthzError::Forbidden { kind: Self::KIND })
        }
    }
}

impl OwnedResource for Video {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl OwnedResource for Comment {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl OwnedResource for Playlist {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Locate a resource and require that `principal` owns it.
///
/// Every mutating path goes through here before touching the resource.
pub async fn locate_owned<T: OwnedResource>(
    store: &dyn Store,
    principal: &Principal,
    raw_id: &str,
) -> AuthzResult<T> {
    let resource = locate::<T>(store, raw_id).await?;
    resource.ensure_owner(principal)?;
    Ok(resource)
}
