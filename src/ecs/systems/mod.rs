//! ECS systems run by the owner of the world.

pub mod bounds;

pub use bounds::bounding_box_system;
