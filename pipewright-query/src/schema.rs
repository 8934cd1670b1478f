//! Entity schemas.
//!
//! Types that map to a collection describe their fields once through the
//! [`Entity`] trait. A [`SchemaRegistry`] resolves each type's schema on first
//! use and caches it; an [`EncodeContext`] built from a schema translates field
//! names to their stored names while encoding.
//!
//! ```rust
//! use pipewright_query::schema::{Entity, FieldSchema, SchemaRegistry};
//!
//! struct Order;
//!
//! impl Entity for Order {
//!     const COLLECTION: &'static str = "orders";
//!
//!     fn describe() -> Vec<FieldSchema> {
//!         vec![
//!             FieldSchema::new("id").stored_as("_id"),
//!             FieldSchema::new("orderDate").stored_as("order_date"),
//!             FieldSchema::new("quantity"),
//!         ]
//!     }
//! }
//!
//! let registry = SchemaRegistry::new();
//! let schema = registry.resolve::<Order>();
//! assert_eq!(schema.stored_name("orderDate"), Some("order_date"));
//! ```

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::context::EncodeContext;

/// A type stored in a MongoDB collection.
pub trait Entity: 'static {
    /// The collection documents of this type live in.
    const COLLECTION: &'static str;

    /// Describe the stored fields of this type.
    fn describe() -> Vec<FieldSchema>;
}

/// One mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Name used in application code.
    pub name: String,
    /// Name used in stored documents.
    pub stored_name: String,
}

impl FieldSchema {
    /// A field stored under its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            stored_name: name.clone(),
            name,
        }
    }

    /// Store the field under a different name.
    pub fn stored_as(mut self, stored_name: impl Into<String>) -> Self {
        self.stored_name = stored_name.into();
        self
    }
}

/// The resolved schema of one entity type.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    type_name: &'static str,
    collection: String,
    fields: Vec<FieldSchema>,
    index: HashMap<String, usize>,
}

impl EntitySchema {
    /// Build a schema from its parts.
    pub fn new(
        type_name: &'static str,
        collection: impl Into<String>,
        fields: Vec<FieldSchema>,
    ) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            type_name,
            collection: collection.into(),
            fields,
            index,
        }
    }

    /// Describe an entity type.
    pub fn of<T: Entity>() -> Self {
        Self::new(type_name::<T>(), T::COLLECTION, T::describe())
    }

    /// Rust type name of the entity.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Mapped fields.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Look up a field by its application name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// The stored name for an application field name.
    pub fn stored_name(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.stored_name.as_str())
    }
}

/// A cache of entity schemas keyed by type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<EntitySchema>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe `T` and store its schema, replacing an earlier entry.
    pub fn register<T: Entity>(&self) -> Arc<EntitySchema> {
        let schema = Arc::new(EntitySchema::of::<T>());
        debug!(
            entity = schema.type_name(),
            collection = schema.collection(),
            fields = schema.fields().len(),
            "Registered entity schema"
        );
        self.schemas
            .write()
            .insert(TypeId::of::<T>(), Arc::clone(&schema));
        schema
    }

    /// The cached schema for `T`, if registered.
    pub fn get<T: Entity>(&self) -> Option<Arc<EntitySchema>> {
        self.schemas.read().get(&TypeId::of::<T>()).cloned()
    }

    /// The schema for `T`, describing it on first use.
    pub fn resolve<T: Entity>(&self) -> Arc<EntitySchema> {
        if let Some(schema) = self.get::<T>() {
            return schema;
        }
        self.register::<T>()
    }

    /// An encoding context mapping field names through `T`'s schema.
    pub fn context_for<T: Entity>(&self) -> EncodeContext {
        EncodeContext::for_schema(self.resolve::<T>())
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Whether no schema is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
