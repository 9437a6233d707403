//! The schema transformation engine. Everything in here is synchronous and works on one record
//! at a time; fetching and saving belongs to [crate::client].

pub mod application;
pub(crate) mod fields;
pub mod layer;
pub mod layer_tree;
pub mod reproject;
pub mod type_mapper;

pub use application::{transform_application, ApplicationOptions};
pub use fields::describe_record;
pub use layer::transform_layer;
pub use layer_tree::{remap_layer_ids, walk};
pub use reproject::{normalize_projection, Reprojector};
pub use type_mapper::map_type;
