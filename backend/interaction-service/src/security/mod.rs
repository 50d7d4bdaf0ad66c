//! Trusted boundary between callers and the document store

pub mod rules;
pub mod secured_store;

pub use rules::{AccessRules, Change};
pub use secured_store::SecuredStore;
