pub mod application;
pub mod id_map;
pub mod layer;
pub mod layer_tree;
pub mod metadata;

pub use application::{ApplicationClientConfig, MapView, TargetApplication};
pub use id_map::IdentifierMap;
pub use layer::{LayerType, TargetLayer};
pub use layer_tree::LayerTreeNode;
pub use metadata::{Legal, Theme};

/// A planar or geographic coordinate pair in the order (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
