//! fieldguard: field-level access control and projection for document stores
//!
//! Object types are declared once as schema trees whose nodes carry
//! authorization predicates and read interceptors. The [`engine::Engine`]
//! mediates every read, create, update and delete against a
//! [`store::DocumentStore`]:
//!
//! - reads return only the keys the requester may see
//! - writes are validated field by field and persisted all-or-nothing
//! - submissions apply stricter `submit` rules where declared

pub mod cli;
pub mod config;
pub mod engine;
pub mod hackathon;
pub mod observability;
pub mod patch;
pub mod schema;
pub mod store;
pub mod universe;
