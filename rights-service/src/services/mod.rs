//! Services layer for rights-service.
//!
//! Catalog, grant store, scope hierarchy and the evaluator built on them.

mod attr_filter;
pub mod catalog;
mod context;
mod deadline;
pub mod definitions;
pub mod directory;
pub mod error;
mod evaluator;
pub mod hierarchy;
pub mod store;

pub use attr_filter::{AttrAccess, AttributeFilter};
pub use catalog::RightCatalog;
pub use context::AccessContext;
pub use directory::{GroupDirectory, GroupMembership, InMemoryDirectory};
pub use error::{AccessError, BackendError, CatalogError};
pub use evaluator::{Decision, DecisionBasis, Evaluator, Verdict};
pub use hierarchy::{ScopeLevel, scope_chain};
pub use store::{GrantBackend, GrantSet, GrantStore, MemoryBackend};
