//! Authorization for entities that live in folders.

pub mod authorizer;

pub use authorizer::MemberAuthorizer;
