pub mod hierarchy_detection;
pub mod hierarchy_models;
pub mod manager_resolver;

pub use hierarchy_models::{validate_hierarchy, AccessPath, HierarchyError, HierarchyRecord};
pub use manager_resolver::{HierarchyStore, ManagerResolver};
