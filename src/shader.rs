pub mod factory;
pub mod program;
pub mod templates;
