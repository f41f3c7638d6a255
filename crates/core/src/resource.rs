//! Resource contract for every object kind held by the state store.

use serde::{Serialize, de::DeserializeOwned};

use crate::meta::{ObjectMeta, OwnerReference};

/// A named, persisted object kind.
///
/// This is intentionally small: the store only needs a stable kind name and
/// access to metadata. Everything else is the kind's own business.
pub trait Resource: Clone + core::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable kind identifier (e.g. `"SignupRequest"`).
    const KIND: &'static str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }

    /// Build a controller owner reference pointing at this object.
    ///
    /// Returns `None` until the object has been persisted (no uid yet).
    fn controller_reference(&self) -> Option<OwnerReference> {
        self.meta().uid.map(|uid| OwnerReference {
            kind: Self::KIND.to_string(),
            name: self.name().to_string(),
            uid,
            controller: true,
        })
    }
}
