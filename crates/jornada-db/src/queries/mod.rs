//! Query functions, one module per table group.

pub mod plans;
pub mod tenants;
pub mod users;
