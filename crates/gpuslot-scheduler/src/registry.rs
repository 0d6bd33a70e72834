//! Registry of provisioned GPU resources

use gpuslot_core::{DaemonConfig, Resource, ResourceId, SlotError, SlotResult};
use std::collections::HashMap;
use tracing::{info, warn};

/// Read-only set of schedulable resources, loaded once at boot
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    /// Resources ordered by id
    resources: Vec<Resource>,
    /// Position of each id in `resources`
    by_id: HashMap<ResourceId, usize>,
}

impl ResourceRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn new(mut resources: Vec<Resource>) -> SlotResult<Self> {
        resources.sort_by_key(|r| r.id);

        let mut by_id = HashMap::with_capacity(resources.len());
        for (pos, resource) in resources.iter().enumerate() {
            if by_id.insert(resource.id, pos).is_some() {
                return Err(SlotError::Config(format!(
                    "Duplicate resource id: {}",
                    resource.id
                )));
            }
        }

        if resources.is_empty() {
            warn!("Resource registry is empty; every reservation request will be rejected");
        } else {
            info!(resources = resources.len(), "Resource registry loaded");
        }

        Ok(Self { resources, by_id })
    }

    /// Build a registry from the `[[resources]]` section of the daemon config
    pub fn from_config(config: &DaemonConfig) -> SlotResult<Self> {
        config.validate()?;
        Self::new(config.resources.clone())
    }

    /// All resources in ascending id order
    pub fn list(&self) -> &[Resource] {
        &self.resources
    }

    /// Look up a resource
    pub fn get(&self, id: ResourceId) -> SlotResult<&Resource> {
        self.by_id
            .get(&id)
            .map(|&pos| &self.resources[pos])
            .ok_or(SlotError::ResourceNotFound(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(id: ResourceId) -> Resource {
        Resource::new(id, format!("GPU {}", id), "RTX 4090", 24.0, "lab-node-1")
    }

    #[test]
    fn test_registry_sorted_by_id() {
        let registry = ResourceRegistry::new(vec![gpu(3), gpu(1), gpu(2)]).unwrap();
        let ids: Vec<ResourceId> = registry.ids().collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(registry.get(2).unwrap().name, "GPU 2");
    }

    #[test]
    fn test_registry_unknown_id() {
        let registry = ResourceRegistry::new(vec![gpu(1)]).unwrap();
        assert!(matches!(
            registry.get(7),
            Err(SlotError::ResourceNotFound(7))
        ));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let result = ResourceRegistry::new(vec![gpu(1), gpu(1)]);
        assert!(matches!(result, Err(SlotError::Config(_))));
    }

    #[test]
    fn test_registry_from_config() {
        let mut config = DaemonConfig::default();
        config.resources = vec![gpu(5)];
        let registry = ResourceRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
