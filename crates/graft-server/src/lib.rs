#![forbid(unsafe_code)]
//! graft server: the resolver registry, standard entity resolvers, authorization and storage
//! collaborators, and the axum HTTP surface that dispatches field calls through them.

mod app;
pub mod auth;
mod config;
pub mod demo;
mod http;
pub mod registry;
pub mod resolvers;
pub mod store;
mod telemetry;

pub use app::{bootstrap, build_app_state, StartupError};
pub use auth::{Action, Actor, AllowAll, AuthorizationGate, Decision, DenyListGate};
pub use config::{ServerConfig, DEV_CURSOR_SECRET};
pub use demo::SchemaDeclaration;
pub use http::{build_router, AppState, ACTOR_HEADER};
pub use registry::{
    FieldCoordinate, Registry, RegistryBuilder, RegistryError, RegistryViolation, ResolveContext,
    Resolver,
};
pub use resolvers::GraphServices;
pub use store::{DataStore, MemoryStore, StoreError};
pub use telemetry::init_tracing;

pub const CRATE_NAME: &str = "graft-server";
