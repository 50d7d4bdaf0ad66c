pub mod blogs;
pub mod comments;
pub mod relations;

pub use blogs::BlogRepository;
pub use comments::CommentRepository;
pub use relations::RelationRepository;
