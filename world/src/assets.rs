//! Enemy assets the entity factory knows how to instantiate.

use std::collections::BTreeMap;

use plot_defence_core::{AssetHandle, AssetResolver};

/// Registered asset references and the handles issued for them.
///
/// Handles are allocated in registration order starting at zero and never
/// reused.
#[derive(Clone, Debug, Default)]
pub struct AssetRegistry {
    handles: BTreeMap<String, AssetHandle>,
    refs: Vec<String>,
}

impl AssetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset reference, returning its handle. Registering the
    /// same reference twice yields the original handle.
    pub fn register(&mut self, asset_ref: &str) -> AssetHandle {
        if let Some(handle) = self.handles.get(asset_ref) {
            return *handle;
        }

        let next = u32::try_from(self.refs.len()).unwrap_or(u32::MAX);
        let handle = AssetHandle::new(next);
        let _ = self.handles.insert(asset_ref.to_owned(), handle);
        self.refs.push(asset_ref.to_owned());
        handle
    }

    /// Looks up the handle of a registered reference.
    #[must_use]
    pub fn handle(&self, asset_ref: &str) -> Option<AssetHandle> {
        self.handles.get(asset_ref).copied()
    }

    /// Reference the handle was issued for.
    #[must_use]
    pub fn asset_ref(&self, handle: AssetHandle) -> Option<&str> {
        usize::try_from(handle.get())
            .ok()
            .and_then(|index| self.refs.get(index))
            .map(String::as_str)
    }

    /// Reports whether the handle was issued by this registry.
    #[must_use]
    pub fn contains(&self, handle: AssetHandle) -> bool {
        self.asset_ref(handle).is_some()
    }

    /// Number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Reports whether no asset was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl AssetResolver for AssetRegistry {
    fn resolve(&mut self, asset_ref: &str) -> Option<AssetHandle> {
        self.handle(asset_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut registry = AssetRegistry::new();
        let grunt = registry.register("Enemies/Grunt");
        let brute = registry.register("Enemies/Brute");

        assert_eq!(registry.register("Enemies/Grunt"), grunt);
        assert_ne!(grunt, brute);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.asset_ref(brute), Some("Enemies/Brute"));
    }

    #[test]
    fn resolver_only_knows_registered_refs() {
        let mut registry = AssetRegistry::new();
        let grunt = registry.register("Enemies/Grunt");

        assert_eq!(registry.resolve("Enemies/Grunt"), Some(grunt));
        assert_eq!(registry.resolve("Enemies/Dragon"), None);
        assert!(!registry.contains(AssetHandle::new(5)));
    }
}
