//! Schedulable GPU resources

use serde::{Deserialize, Serialize};

/// Identifier of a provisioned GPU
pub type ResourceId = u32;

/// A schedulable GPU with fixed identity and capacity metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique, immutable identifier
    pub id: ResourceId,
    /// Human-readable name (e.g., "RTX5090-1")
    pub name: String,
    /// GPU model (e.g., "RTX 5090")
    pub model: String,
    /// Memory capacity in GB
    pub memory_gb: f64,
    /// Host the GPU is installed in
    pub host: String,
    /// Slot or device index inside the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Resource {
    /// Create a resource without slot or notes
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        model: impl Into<String>,
        memory_gb: f64,
        host: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            model: model.into(),
            memory_gb,
            host: host.into(),
            slot: None,
            notes: None,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {}GB) on {}", self.name, self.model, self.memory_gb, self.host)
    }
}
