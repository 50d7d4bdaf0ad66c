//! Reader-side interaction state

pub mod error;
pub mod identity;
pub mod session;

pub use error::InteractionError;
pub use identity::{IdentityProvider, SessionIdentity};
pub use session::{InteractionState, PostSession};
