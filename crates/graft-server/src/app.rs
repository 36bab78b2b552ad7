// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use graft_core::ExitCode;
use graft_query::{ConnectionResolver, CursorCodec, IdCodec};
use tracing::info;

use crate::auth::{AllowAll, AuthorizationGate, DenyListGate};
use crate::config::ServerConfig;
use crate::demo::{build_registry, seed, DeclarationError, SchemaDeclaration};
use crate::http::AppState;
use crate::registry::RegistryError;
use crate::resolvers::GraphServices;
use crate::store::{DataStore, MemoryStore};

#[derive(Debug)]
pub enum StartupError {
    Config(String),
    Declaration(DeclarationError),
    Registry(RegistryError),
    Seed(String),
}

impl StartupError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::Usage,
            Self::Declaration(_) | Self::Registry(_) => ExitCode::Validation,
            Self::Seed(_) => ExitCode::Internal,
        }
    }
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Declaration(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Seed(msg) => write!(f, "seeding failed: {msg}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Wires services from `config` and freezes the registry for `declaration`.
pub fn build_app_state(
    config: &ServerConfig,
    declaration: &SchemaDeclaration,
    store: Arc<dyn DataStore>,
) -> Result<AppState, StartupError> {
    config.validate().map_err(StartupError::Config)?;
    let cursors = CursorCodec::new(config.cursor_secret.as_bytes())
        .map_err(|e| StartupError::Config(e.to_string()))?;
    let gate: Arc<dyn AuthorizationGate> = if config.deny_anonymous_writes {
        Arc::new(DenyListGate::new().deny_anonymous_writes(true))
    } else {
        Arc::new(AllowAll)
    };
    let services = Arc::new(GraphServices {
        store,
        ids: IdCodec::new(declaration.type_names().cloned()),
        connections: ConnectionResolver::new(cursors, config.limits)
            .with_total_count(config.include_total_count),
        gate,
    });
    let registry = build_registry(declaration, &services).map_err(StartupError::Registry)?;
    Ok(AppState { registry, services })
}

/// Loads the configured declaration (or the bundled demo), optionally seeds the in-memory store,
/// and builds the state.
pub fn bootstrap(config: &ServerConfig) -> Result<AppState, StartupError> {
    let declaration = match &config.schema_path {
        Some(path) => SchemaDeclaration::from_path(path),
        None => SchemaDeclaration::demo(),
    }
    .map_err(StartupError::Declaration)?;
    let store = Arc::new(MemoryStore::new());
    let state = build_app_state(config, &declaration, store.clone())?;
    if config.seed_demo && config.schema_path.is_none() {
        let seeded = seed(&*store).map_err(|e| StartupError::Seed(e.to_string()))?;
        info!(records = seeded.len(), "demo data seeded");
    }
    Ok(state)
}
