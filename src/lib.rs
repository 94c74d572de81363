pub mod cache;
pub mod corpus;
pub mod error;
pub mod ident;
pub mod pipeline;
pub mod progress;
pub mod validate;
