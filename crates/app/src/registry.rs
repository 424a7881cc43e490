//! Characteristic registry: logical names to discovered handles.

use std::collections::HashMap;

use spherolink_domain::characteristic::{CharacteristicHandle, CharacteristicName};

use crate::error::SessionError;
use crate::ports::DiscoveredCharacteristic;

/// Handles resolved for the five fixed characteristics.
///
/// Populated once per discovery, cleared on disconnect.
#[derive(Debug, Default)]
pub struct CharacteristicRegistry {
    handles: HashMap<CharacteristicName, CharacteristicHandle>,
}

impl CharacteristicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every name by UUID against the discovered set.
    ///
    /// Replaces any previous resolution. Returns the names that had no
    /// matching characteristic; a miss is not fatal.
    pub fn resolve(&mut self, discovered: &[DiscoveredCharacteristic]) -> Vec<CharacteristicName> {
        self.handles.clear();

        let mut missing = Vec::new();
        for name in CharacteristicName::ALL {
            match discovered.iter().find(|c| c.uuid == name.uuid()) {
                Some(found) => {
                    self.handles.insert(name, found.handle);
                }
                None => missing.push(name),
            }
        }
        missing
    }

    #[must_use]
    pub fn get(&self, name: CharacteristicName) -> Option<CharacteristicHandle> {
        self.handles.get(&name).copied()
    }

    /// Like [`get`](Self::get) but a miss is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnresolvedCharacteristic`] when `name` has no handle.
    pub fn require(&self, name: CharacteristicName) -> Result<CharacteristicHandle, SessionError> {
        self.get(name)
            .ok_or(SessionError::UnresolvedCharacteristic(name))
    }

    /// Reverse lookup used to label write-complete events.
    #[must_use]
    pub fn name_of(&self, handle: CharacteristicHandle) -> Option<CharacteristicName> {
        self.handles
            .iter()
            .find_map(|(name, h)| (*h == handle).then_some(*name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(names: &[CharacteristicName]) -> Vec<DiscoveredCharacteristic> {
        (10u16..)
            .zip(names)
            .map(|(raw, name)| DiscoveredCharacteristic {
                uuid: name.uuid(),
                handle: CharacteristicHandle::new(raw),
            })
            .collect()
    }

    #[test]
    fn should_resolve_all_five_names() {
        let mut registry = CharacteristicRegistry::new();
        let missing = registry.resolve(&discovered(&CharacteristicName::ALL));
        assert!(missing.is_empty());
        assert_eq!(
            registry.get(CharacteristicName::Antidos),
            Some(CharacteristicHandle::new(10))
        );
        assert_eq!(
            registry.get(CharacteristicName::Roll),
            Some(CharacteristicHandle::new(14))
        );
    }

    #[test]
    fn should_report_missing_names_without_failing() {
        let mut registry = CharacteristicRegistry::new();
        let missing = registry.resolve(&discovered(&[
            CharacteristicName::Antidos,
            CharacteristicName::Notify,
        ]));
        assert_eq!(
            missing,
            vec![
                CharacteristicName::Wakecpu,
                CharacteristicName::Txpower,
                CharacteristicName::Roll,
            ]
        );
        assert!(registry.get(CharacteristicName::Notify).is_some());
    }

    #[test]
    fn should_fail_require_for_unresolved_name() {
        let registry = CharacteristicRegistry::new();
        assert_eq!(
            registry.require(CharacteristicName::Roll),
            Err(SessionError::UnresolvedCharacteristic(CharacteristicName::Roll))
        );
    }

    #[test]
    fn should_ignore_foreign_characteristics() {
        let mut registry = CharacteristicRegistry::new();
        let foreign = DiscoveredCharacteristic {
            uuid: uuid::Uuid::from_u128(0x0000_2a00_0000_1000_8000_0080_5f9b_34fb),
            handle: CharacteristicHandle::new(1),
        };
        let missing = registry.resolve(&[foreign]);
        assert_eq!(missing.len(), 5);
        assert!(registry.is_empty());
    }

    #[test]
    fn should_map_handle_back_to_name() {
        let mut registry = CharacteristicRegistry::new();
        registry.resolve(&discovered(&CharacteristicName::ALL));
        assert_eq!(
            registry.name_of(CharacteristicHandle::new(12)),
            Some(CharacteristicName::Txpower)
        );
        assert_eq!(registry.name_of(CharacteristicHandle::new(99)), None);
    }

    #[test]
    fn should_clear_handles() {
        let mut registry = CharacteristicRegistry::new();
        registry.resolve(&discovered(&CharacteristicName::ALL));
        registry.clear();
        assert!(registry.is_empty());
    }
}
