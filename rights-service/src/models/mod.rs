pub mod grant;
pub mod grantee;
pub mod right;
pub mod target;

pub use grant::{Grant, GrantKey, GrantModifier, Polarity};
pub use grantee::{Actor, ActorKind, Grantee, GranteeSet};
pub use right::{AccessMode, AttrSpec, Right, RightClass, RightDefinition};
pub use target::{Target, TargetType};
