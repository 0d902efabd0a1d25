//! Broad-phase spatial index: a dynamic AABB tree exposing an incremental
//! proxy-based API (`create_proxy`/`move_proxy`/`query`/`ray_cast`) that
//! the contact manager relies on for incremental pair-finding.

mod tree;

pub use tree::{DynamicTree, RayCastInput, TreeProxyId};
