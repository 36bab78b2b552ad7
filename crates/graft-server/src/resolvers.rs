// SPDX-License-Identifier: Apache-2.0

//! Resolvers shared by every entity type: property reads, node lookup, ordered lists and the
//! create/update mutations.
//!
//! Root fields follow one naming scheme per type `T`: `Query.t` (node by global id),
//! `Query.ts` (connection), `Mutation.createT` and `Mutation.updateT`.

use std::sync::Arc;

use graft_api::params::{
    parse_create_input, parse_typed_global_id_arg, parse_update_input, reject_unknown_args, PAGE_ARGS,
    SORT_ARGS,
};
use graft_api::wire::{render_connection, render_record};
use graft_api::{parse_page_args, parse_sort_order, ApiError};
use graft_core::{FieldName, TypeName};
use graft_model::{merge_update, validate_create, EntitySchema, GlobalId, Record};
use graft_query::{ConnectionResolver, IdCodec};
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::{authorize, Action, AuthorizationGate};
pub use crate::registry::{MUTATION_TYPE, QUERY_TYPE};
use crate::registry::{FieldCoordinate, RegistryBuilder, ResolveContext, Resolver};
use crate::store::{DataStore, StoreSource};

/// Collaborators every resolver reaches through.
pub struct GraphServices {
    pub store: Arc<dyn DataStore>,
    pub ids: IdCodec,
    pub connections: ConnectionResolver,
    pub gate: Arc<dyn AuthorizationGate>,
}

impl std::fmt::Debug for GraphServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphServices")
            .field("ids", &self.ids)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

/// Root field names of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFields {
    pub node: FieldCoordinate,
    pub list: FieldCoordinate,
    pub create: FieldCoordinate,
    pub update: FieldCoordinate,
}

impl RootFields {
    pub fn for_type(type_name: &TypeName) -> graft_core::Result<Self> {
        let name = type_name.as_str();
        let mut lower = String::with_capacity(name.len());
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            lower.push(first.to_ascii_lowercase());
            lower.extend(chars);
        }
        let query = TypeName::new(QUERY_TYPE)?;
        let mutation = TypeName::new(MUTATION_TYPE)?;
        Ok(Self {
            node: FieldCoordinate::new(query.clone(), FieldName::new(lower.as_str())?),
            list: FieldCoordinate::new(query, FieldName::new(format!("{lower}s"))?),
            create: FieldCoordinate::new(mutation.clone(), FieldName::new(format!("create{name}"))?),
            update: FieldCoordinate::new(mutation, FieldName::new(format!("update{name}"))?),
        })
    }

    #[must_use]
    pub fn all(&self) -> [&FieldCoordinate; 4] {
        [&self.node, &self.list, &self.create, &self.update]
    }
}

/// Reads a stored field from the parent record. Missing fields resolve to `null`.
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    field: String,
}

impl PropertyResolver {
    #[must_use]
    pub fn new(field: &FieldName) -> Self {
        Self {
            field: field.as_str().to_string(),
        }
    }
}

impl Resolver for PropertyResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, _args: &Map<String, Value>) -> Result<Value, ApiError> {
        let parent = ctx.parent.ok_or_else(|| {
            ApiError::internal(format!("{} resolved without a parent", ctx.coordinate))
        })?;
        Ok(parent.field(&self.field).cloned().unwrap_or(Value::Null))
    }
}

struct EntityResolver {
    services: Arc<GraphServices>,
    type_name: TypeName,
}

impl EntityResolver {
    fn schema<'a>(&self, ctx: &'a ResolveContext<'_>) -> Result<&'a EntitySchema, ApiError> {
        ctx.registry.entity(&self.type_name).ok_or_else(|| {
            ApiError::internal(format!("no schema registered for `{}`", self.type_name))
        })
    }

    fn decode_id(&self, args: &Map<String, Value>) -> Result<GlobalId, ApiError> {
        parse_typed_global_id_arg(args, "id", &self.services.ids, &self.type_name)
    }

    fn render(&self, ctx: &ResolveContext<'_>, record: &Record) -> Result<Value, ApiError> {
        let resolved = ctx.registry.resolve_fields(ctx.actor, record)?;
        render_record(&resolved, &self.services.ids)
    }
}

/// `Query.t(id)`: one node by global id.
struct NodeResolver(EntityResolver);

impl Resolver for NodeResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, args: &Map<String, Value>) -> Result<Value, ApiError> {
        reject_unknown_args(args, &["id"])?;
        let id = self.0.decode_id(args)?;
        authorize(&*self.0.services.gate, ctx.actor, Action::Read, &id.to_string())?;
        let record = self
            .0
            .services
            .store
            .get(&id)?
            .ok_or_else(|| ApiError::not_found(&id.to_string()))?;
        self.0.render(ctx, &record)
    }
}

/// `Query.ts(first, after, last, before, sortBy, direction)`: a connection over the type.
struct ListResolver(EntityResolver);

impl Resolver for ListResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, args: &Map<String, Value>) -> Result<Value, ApiError> {
        let allowed: Vec<&str> = PAGE_ARGS.iter().chain(SORT_ARGS.iter()).copied().collect();
        reject_unknown_args(args, &allowed)?;
        let this = &self.0;
        authorize(&*this.services.gate, ctx.actor, Action::List, this.type_name.as_str())?;
        let order = parse_sort_order(args, this.schema(ctx)?)?;
        let page_args = parse_page_args(args)?;
        let source = StoreSource(&*this.services.store);
        let page = this.services.connections.resolve(&source, &order, &page_args)?;
        debug!(field = %ctx.coordinate, edges = page.edges.len(), "connection resolved");
        let page = page.try_map(|record| ctx.registry.resolve_fields(ctx.actor, &record))?;
        render_connection(page, &this.services.ids)
    }
}

/// `Mutation.createT(input)`: validates a full input and stores a new node.
struct CreateResolver(EntityResolver);

impl Resolver for CreateResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, args: &Map<String, Value>) -> Result<Value, ApiError> {
        reject_unknown_args(args, &["input"])?;
        let this = &self.0;
        authorize(&*this.services.gate, ctx.actor, Action::Create, this.type_name.as_str())?;
        let input = parse_create_input(args, "input")?;
        let patch = validate_create(this.schema(ctx)?, &input)?;
        let mut record = Record::new(this.type_name.clone(), "", Map::new());
        record.apply(&patch)?;
        let stored = this.services.store.insert(record)?;
        debug!(type_name = %this.type_name, local_id = %stored.local_id, "node created");
        this.render(ctx, &stored)
    }
}

/// `Mutation.updateT(id, input)`: applies a sparse update. Absent fields keep their values and
/// explicit nulls clear them.
struct UpdateResolver(EntityResolver);

impl Resolver for UpdateResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, args: &Map<String, Value>) -> Result<Value, ApiError> {
        reject_unknown_args(args, &["id", "input"])?;
        let this = &self.0;
        let id = this.decode_id(args)?;
        authorize(&*this.services.gate, ctx.actor, Action::Update, &id.to_string())?;
        let input = parse_update_input(args, "input")?;
        let patch = merge_update(this.schema(ctx)?, &input)?;
        let updated = this.services.store.put(&id, &patch)?;
        debug!(id = %id, fields = patch.len(), "node updated");
        this.render(ctx, &updated)
    }
}

/// Binds the root fields and property resolvers of `schema`. Declarations are left to the
/// caller so the registry can check them against these bindings.
pub fn bind_standard(
    builder: &mut RegistryBuilder,
    schema: &EntitySchema,
    services: &Arc<GraphServices>,
) -> graft_core::Result<()> {
    let type_name = schema.type_name();
    let entity = || EntityResolver {
        services: Arc::clone(services),
        type_name: type_name.clone(),
    };
    let roots = RootFields::for_type(type_name)?;
    builder
        .bind(format!("node:{type_name}"), roots.node, Arc::new(NodeResolver(entity())))
        .bind(format!("list:{type_name}"), roots.list, Arc::new(ListResolver(entity())))
        .bind(
            format!("create:{type_name}"),
            roots.create,
            Arc::new(CreateResolver(entity())),
        )
        .bind(
            format!("update:{type_name}"),
            roots.update,
            Arc::new(UpdateResolver(entity())),
        );
    for spec in schema.fields() {
        builder.bind(
            format!("prop:{type_name}.{}", spec.name),
            FieldCoordinate::new(type_name.clone(), spec.name.clone()),
            Arc::new(PropertyResolver::new(&spec.name)),
        );
    }
    Ok(())
}
