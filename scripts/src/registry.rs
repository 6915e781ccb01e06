//! The typed implementation artifact registry.
//!
//! Artifacts are resolved by explicit name & version at orchestration start,
//! from a directory of JSON artifact files produced by the contract build.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use upgrade_common::types::{ContractKey, ImplementationArtifact};

use crate::constants::ARTIFACT_EXTENSION;
use crate::errors::RegistryError;

/// A read-only map from contract key to its compiled artifact
#[derive(Default)]
pub struct ArtifactRegistry {
    /// The registered artifacts
    artifacts: HashMap<ContractKey, ImplementationArtifact>,
}

impl ArtifactRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every artifact file in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        let entries =
            fs::read_dir(dir).map_err(|e| RegistryError::ArtifactParsing(e.to_string()))?;
        for entry in entries {
            let path = entry
                .map_err(|e| RegistryError::ArtifactParsing(e.to_string()))?
                .path();
            if !path
                .extension()
                .is_some_and(|ext| ext == ARTIFACT_EXTENSION)
            {
                continue;
            }

            let contents = fs::read_to_string(&path)
                .map_err(|e| RegistryError::ArtifactParsing(e.to_string()))?;
            let artifact: ImplementationArtifact = serde_json::from_str(&contents)
                .map_err(|e| RegistryError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

            registry.insert(artifact);
        }

        Ok(registry)
    }

    /// Register an artifact under its key
    pub fn insert(&mut self, artifact: ImplementationArtifact) {
        self.artifacts.insert(artifact.key.clone(), artifact);
    }

    /// Resolve an artifact by key
    pub fn resolve(&self, key: &ContractKey) -> Result<&ImplementationArtifact, RegistryError> {
        self.artifacts
            .get(key)
            .ok_or_else(|| RegistryError::UnknownArtifact(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use upgrade_common::types::{ContractKey, ImplementationArtifact, SlotType};

    use super::ArtifactRegistry;
    use crate::errors::RegistryError;

    /// A hand-written artifact file, the shape the contract build emits
    const ARTIFACT_JSON: &str = r#"{
        "name": "staking",
        "version": "1.0.0",
        "bytecode": "6080604052",
        "layout": {
            "slots": [
                { "slot": 0, "label": "owner", "ty": { "kind": "address" } },
                { "slot": 1, "label": "total_staked", "ty": { "kind": "uint", "bits": 256 } }
            ]
        }
    }"#;

    #[test]
    fn test_artifact_file_parsing() {
        let artifact: ImplementationArtifact = serde_json::from_str(ARTIFACT_JSON).unwrap();

        assert_eq!(artifact.key, ContractKey::new("staking", "1.0.0"));
        assert_eq!(artifact.bytecode, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(artifact.layout.len(), 2);
        assert_eq!(artifact.layout.slots[1].ty, SlotType::Uint { bits: 256 });
    }

    #[test]
    fn test_resolution() {
        let artifact: ImplementationArtifact = serde_json::from_str(ARTIFACT_JSON).unwrap();
        let key = artifact.key.clone();

        let mut registry = ArtifactRegistry::new();
        registry.insert(artifact);

        assert!(registry.resolve(&key).is_ok());

        let missing = ContractKey::new("staking", "9.9.9");
        assert_eq!(
            registry.resolve(&missing).unwrap_err(),
            RegistryError::UnknownArtifact(missing),
        );
    }
}
