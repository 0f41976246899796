//! Property path access.
//!
//! Resolves dot-delimited paths like `"owner.pet.name"` against registered
//! metadata, re-resolving the runtime type of each intermediate object so
//! heterogeneous graphs traverse correctly.

mod error;

pub use error::AccessError;

use std::any::Any;

use crate::metadata::TypeRegistry;

/// Reads and writes fields on arbitrary registered objects by dotted name.
///
/// ## Example
///
/// ```
/// use imbue::{FieldAccess, PropertyAccessor, TypeMetadata, TypeRegistry};
///
/// #[derive(Default)]
/// struct Pet { name: String }
/// #[derive(Default)]
/// struct Owner { pet: Pet }
///
/// let mut registry = TypeRegistry::new();
/// registry.register(
///     TypeMetadata::builder::<Pet>("Pet")
///         .field("name", "string", FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name))
///         .build()?,
/// );
/// registry.register(
///     TypeMetadata::builder::<Owner>("Owner")
///         .field("pet", "Pet", FieldAccess::direct(|o: &Owner| &o.pet, |o: &mut Owner| &mut o.pet))
///         .build()?,
/// );
///
/// let mut owner = Owner::default();
/// let accessor = PropertyAccessor::new(&registry);
/// accessor.set(&mut owner, "pet.name", Box::new("rex".to_string()))?;
/// assert_eq!(accessor.get_as::<String>(&owner, "pet.name")?, "rex");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct PropertyAccessor<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> PropertyAccessor<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Reads the value at `path`, traversing intermediate objects.
    ///
    /// Each segment is resolved against the metadata of the runtime type of
    /// the object reached so far; method-backed fields are read through
    /// their registered getter.
    pub fn get<'a>(&self, object: &'a dyn Any, path: &str) -> Result<&'a dyn Any, AccessError> {
        let mut current = object;

        for segment in split_path(path)? {
            current = self.read(current, segment)?;
        }

        Ok(current)
    }

    /// Reads the value at `path` and downcasts it to `T`.
    pub fn get_as<'a, T: 'static>(
        &self,
        object: &'a dyn Any,
        path: &str,
    ) -> Result<&'a T, AccessError> {
        self.get(object, path)?
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::TypeMismatch {
                path: path.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Writes `value` at `path`.
    ///
    /// Intermediate segments are traversed mutably (so they must be direct
    /// fields); the final segment goes through the field capability,
    /// invoking the registered setter method when one was declared.
    pub fn set(
        &self,
        object: &mut dyn Any,
        path: &str,
        value: Box<dyn Any>,
    ) -> Result<(), AccessError> {
        let segments = split_path(path)?;
        let (last, intermediate) = segments.split_last().expect("path has a segment");

        let mut current = object;

        for segment in intermediate {
            let metadata =
                self.registry
                    .of(&*current)
                    .ok_or_else(|| AccessError::UnregisteredType {
                        segment: segment.to_string(),
                    })?;
            let field = metadata
                .field(segment)
                .ok_or_else(|| AccessError::UnknownField {
                    type_id: metadata.type_id().to_string(),
                    field: segment.to_string(),
                })?;
            current = field.get_mut(current)?;
        }

        let metadata = self
            .registry
            .of(&*current)
            .ok_or_else(|| AccessError::UnregisteredType {
                segment: last.to_string(),
            })?;
        let field = metadata
            .field(last)
            .ok_or_else(|| AccessError::UnknownField {
                type_id: metadata.type_id().to_string(),
                field: last.to_string(),
            })?;

        field.set(current, value)
    }

    fn read<'a>(&self, obj: &'a dyn Any, segment: &str) -> Result<&'a dyn Any, AccessError> {
        let metadata = self
            .registry
            .of(obj)
            .ok_or_else(|| AccessError::UnregisteredType {
                segment: segment.to_string(),
            })?;
        let field = metadata
            .field(segment)
            .ok_or_else(|| AccessError::UnknownField {
                type_id: metadata.type_id().to_string(),
                field: segment.to_string(),
            })?;

        field.get(obj)
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, AccessError> {
    let segments: Vec<&str> = path.split('.').collect();

    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(AccessError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(segments)
}
