//! The hydration engine.
//!
//! Populates registered object graphs from untyped JSON-like data mappings,
//! dispatching per field on the declared type signature and resolving
//! discriminator-based polymorphism on every metadata fetch.

mod convert;
mod error;

pub use error::HydrateError;

use std::any::Any;

use serde_json::{Map, Value};
use tracing::trace;

use crate::metadata::{TypeMetadata, TypeRegistry, TypeSignature};

/// Default bound on data nesting depth. Hydration of deeper graphs fails
/// with [`HydrateError::DepthLimit`] instead of recursing without bound.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Populates object fields from data mappings, guided by registered
/// metadata.
///
/// ## Example
///
/// ```
/// use imbue::{FieldAccess, Hydrator, TypeMetadata, TypeRegistry};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Pet {
///     name: String,
///     age: i64,
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register(
///     TypeMetadata::builder::<Pet>("Pet")
///         .field("name", "string", FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name))
///         .field("age", "int", FieldAccess::direct(|p: &Pet| &p.age, |p: &mut Pet| &mut p.age))
///         .build()?,
/// );
///
/// let mut pet = Pet::default();
/// let hydrator = Hydrator::new(&registry);
/// hydrator.hydrate(&mut pet, &json!({"name": "rex", "age": "42"}))?;
///
/// assert_eq!(pet.name, "rex");
/// assert_eq!(pet.age, 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Hydrator<'r> {
    registry: &'r TypeRegistry,
    max_depth: usize,
}

impl<'r> Hydrator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the nesting depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Hydrates an existing instance from `data`.
    ///
    /// Metadata is resolved from the runtime type of `target`, including
    /// discriminator resolution against the top-level data. Fields without a
    /// corresponding key in `data` are left untouched; a conversion failure
    /// aborts the call and leaves fields written so far in place.
    pub fn hydrate(&self, target: &mut dyn Any, data: &Value) -> Result<(), HydrateError> {
        let metadata = self
            .registry
            .of(&*target)
            .ok_or(HydrateError::UnregisteredTarget)?;
        let map = as_mapping(metadata.type_id(), data)?;
        let resolved = self.resolve(metadata.type_id(), map)?;

        self.hydrate_fields(target, resolved, map, 0)
    }

    /// Allocates and hydrates a new instance of the type registered under
    /// `type_id`, applying discriminator resolution first.
    ///
    /// The returned box holds the resolved concrete type, so a family id
    /// like `"Animal"` can come back as e.g. a `Dog`.
    pub fn hydrate_new(&self, type_id: &str, data: &Value) -> Result<Box<dyn Any>, HydrateError> {
        let map = as_mapping(type_id, data)?;
        self.instantiate(type_id, map, 0)
    }

    fn instantiate(
        &self,
        type_id: &str,
        data: &Map<String, Value>,
        depth: usize,
    ) -> Result<Box<dyn Any>, HydrateError> {
        let metadata = self.resolve(type_id, data)?;
        let mut instance = metadata.allocate();
        self.hydrate_fields(&mut *instance, metadata, data, depth)?;

        Ok(instance)
    }

    /// Discriminator resolution: when the type has a discriminator and the
    /// data carries its field, the observed value must map to a registered
    /// concrete type. Single-step, applied on every metadata fetch.
    fn resolve(
        &self,
        type_id: &str,
        data: &Map<String, Value>,
    ) -> Result<&TypeMetadata, HydrateError> {
        let metadata = self
            .registry
            .get(type_id)
            .ok_or_else(|| HydrateError::UnknownType(type_id.to_string()))?;

        let Some(discriminator) = metadata.discriminator() else {
            return Ok(metadata);
        };
        let observed = match data.get(discriminator.field()) {
            Some(value) if !value.is_null() => value,
            _ => return Ok(metadata),
        };

        let key = scalar_key(observed).ok_or_else(|| HydrateError::UnresolvedDiscriminator {
            field: discriminator.field().to_string(),
            value: observed.to_string(),
        })?;
        let concrete =
            discriminator
                .resolve(&key)
                .ok_or_else(|| HydrateError::UnresolvedDiscriminator {
                    field: discriminator.field().to_string(),
                    value: key.clone(),
                })?;

        trace!(from = type_id, to = concrete, "resolved discriminator");

        self.registry
            .get(concrete)
            .ok_or_else(|| HydrateError::UnknownType(concrete.to_string()))
    }

    fn hydrate_fields(
        &self,
        target: &mut dyn Any,
        metadata: &TypeMetadata,
        data: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), HydrateError> {
        if depth >= self.max_depth {
            return Err(HydrateError::DepthLimit {
                limit: self.max_depth,
            });
        }

        trace!(type_id = metadata.type_id(), depth, "hydrating instance");

        for field in metadata.fields() {
            let Some(raw) = data.get(field.source_key()) else {
                continue;
            };

            let value = match field.signature() {
                Some(signature) if !convert::is_empty_value(raw) => {
                    self.convert(signature, raw, depth)?
                }
                // Untyped field or empty raw value: assigned as-is.
                _ => convert::raw_value(raw),
            };

            field.set(target, value)?;
        }

        Ok(())
    }

    fn convert(
        &self,
        signature: &TypeSignature,
        value: &Value,
        depth: usize,
    ) -> Result<Box<dyn Any>, HydrateError> {
        match signature {
            TypeSignature::Native(kind) => convert::native(*kind, value),
            TypeSignature::DateFormat(format) => {
                Ok(Box::new(convert::date_with_format(format, value)?))
            }
            TypeSignature::Collection(element_type) => {
                self.convert_collection(element_type, value, depth)
            }
            TypeSignature::Object(type_id) => {
                let map = value.as_object().ok_or_else(|| HydrateError::NotAMapping {
                    type_id: type_id.clone(),
                })?;
                self.instantiate(type_id, map, depth + 1)
            }
        }
    }

    fn convert_collection(
        &self,
        element_type: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Box<dyn Any>, HydrateError> {
        let items = value.as_array().ok_or_else(|| {
            HydrateError::Conversion("value mapped as array is not array".to_string())
        })?;
        let declared = self
            .registry
            .get(element_type)
            .ok_or_else(|| HydrateError::UnknownType(element_type.to_string()))?;

        let mut instances = Vec::with_capacity(items.len());
        for item in items {
            let map = item.as_object().ok_or_else(|| HydrateError::NotAMapping {
                type_id: element_type.to_string(),
            })?;
            instances.push(self.instantiate(element_type, map, depth + 1)?);
        }

        // Collected through the declared element type so the field setter
        // receives a typed Vec.
        declared.collect(instances).ok_or_else(|| {
            HydrateError::Conversion(format!("collection element is not a '{element_type}'"))
        })
    }
}

fn as_mapping<'a>(type_id: &str, data: &'a Value) -> Result<&'a Map<String, Value>, HydrateError> {
    data.as_object().ok_or_else(|| HydrateError::NotAMapping {
        type_id: type_id.to_string(),
    })
}

/// Discriminator values must be scalar; strings are used as-is and numbers
/// stringified for the map lookup.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
