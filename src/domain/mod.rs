pub mod book;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod policy;
pub mod value_objects;

pub use errors::*;
pub use policy::{AccessPolicy, Actor, CatalogAction, Decision, LoanScope, Role};
pub use value_objects::*;
