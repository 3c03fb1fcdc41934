pub mod error;
pub mod periods;
pub mod validation;
