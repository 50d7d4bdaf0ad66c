pub mod clock;
pub mod models;
pub mod paths;

pub use models::{
    BlogCounters, BlogPost, BlogStatus, Comment, CounterField, Identity, RelationKind,
    RelationRecord, ToggleOutcome, ANONYMOUS_NAME,
};
