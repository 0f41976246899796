//! Type metadata registration and lookup.
//!
//! The registry is the hydrator's and accessor's only source of truth about
//! object shapes: an explicit table of [`TypeMetadata`] keyed by type id,
//! built once via [`TypeMetadata::builder`] and then shared immutably.

mod access;
mod signature;

pub use access::FieldAccess;
pub use signature::{NativeKind, SignatureError, TypeSignature};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::access::AccessError;

type FactoryFn = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type CollectFn = Box<dyn Fn(Vec<Box<dyn Any>>) -> Option<Box<dyn Any>> + Send + Sync>;

/// Metadata for one mapped field: name, optional source-key override,
/// parsed declared type, and the access capability.
pub struct FieldDescriptor {
    name: String,
    source: Option<String>,
    signature: Option<TypeSignature>,
    access: FieldAccess,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key looked up in the data mapping: the source override if one was
    /// registered, the field name otherwise.
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    /// The parsed declared type, or `None` for untyped fields.
    pub fn signature(&self) -> Option<&TypeSignature> {
        self.signature.as_ref()
    }

    /// Reads the field from `obj`.
    pub fn get<'a>(&self, obj: &'a dyn Any) -> Result<&'a dyn Any, AccessError> {
        self.access
            .get(obj)
            .ok_or_else(|| AccessError::ReceiverMismatch {
                field: self.name.clone(),
            })
    }

    /// Mutably borrows the field from `obj`. Method-backed fields cannot be
    /// borrowed mutably and fail with [`AccessError::NotTraversable`].
    pub fn get_mut<'a>(&self, obj: &'a mut dyn Any) -> Result<&'a mut dyn Any, AccessError> {
        match self.access.get_mut(obj) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(AccessError::ReceiverMismatch {
                field: self.name.clone(),
            }),
            None => Err(AccessError::NotTraversable {
                field: self.name.clone(),
            }),
        }
    }

    /// Writes `value` into the field, invoking the registered setter method
    /// for accessor-backed fields.
    pub fn set(&self, obj: &mut dyn Any, value: Box<dyn Any>) -> Result<(), AccessError> {
        self.access
            .set(obj, value)
            .map_err(|e| e.for_field(&self.name))
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("signature", &self.signature)
            .field("access", &self.access)
            .finish()
    }
}

/// Discriminator configuration: a field whose observed value selects the
/// concrete type to hydrate, out of a family of registered types.
#[derive(Debug, Clone)]
pub struct Discriminator {
    field: String,
    map: HashMap<String, String>,
}

impl Discriminator {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Maps an observed discriminator value to the registered type id.
    pub fn resolve(&self, value: &str) -> Option<&str> {
        self.map.get(value).map(String::as_str)
    }
}

/// Everything the hydrator and accessor need to know about one registered
/// type: its ordered fields, optional discriminator, and the bare-allocation
/// factory.
pub struct TypeMetadata {
    type_id: String,
    rust_type: TypeId,
    fields: Vec<FieldDescriptor>,
    discriminator: Option<Discriminator>,
    factory: FactoryFn,
    collect: CollectFn,
}

impl TypeMetadata {
    /// Starts a metadata builder for `T`, registered under `type_id`.
    ///
    /// `T::default()` is the bare-allocation factory unless overridden with
    /// [`TypeMetadataBuilder::factory`].
    pub fn builder<T>(type_id: &str) -> TypeMetadataBuilder<T>
    where
        T: Default + 'static,
    {
        TypeMetadataBuilder {
            type_id: type_id.to_string(),
            fields: Vec::new(),
            discriminator: None,
            factory: Box::new(|| Box::new(T::default()) as Box<dyn Any>),
            _marker: PhantomData,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub(crate) fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    /// The registered fields, in registration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field descriptor by field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// Bare-allocates an instance of this type, bypassing any user-defined
    /// construction logic beyond the registered factory.
    pub fn allocate(&self) -> Box<dyn Any> {
        (self.factory)()
    }

    /// Collects hydrated elements into a `Vec` of this type. `None` when an
    /// element is not actually an instance of this type.
    pub(crate) fn collect(&self, items: Vec<Box<dyn Any>>) -> Option<Box<dyn Any>> {
        (self.collect)(items)
    }
}

impl std::fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_id", &self.type_id)
            .field("fields", &self.fields)
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

struct PendingField {
    name: String,
    source: Option<String>,
    signature: String,
    access: FieldAccess,
}

/// Builder for [`TypeMetadata`].
///
/// ## Example
///
/// ```
/// use imbue::{FieldAccess, TypeMetadata};
///
/// #[derive(Default)]
/// struct Pet {
///     name: String,
///     age: i64,
/// }
///
/// let metadata = TypeMetadata::builder::<Pet>("Pet")
///     .field("name", "string", FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name))
///     .field("age", "int", FieldAccess::direct(|p: &Pet| &p.age, |p: &mut Pet| &mut p.age))
///     .build()?;
///
/// assert_eq!(metadata.fields().len(), 2);
/// # Ok::<(), imbue::SignatureError>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct TypeMetadataBuilder<T> {
    type_id: String,
    fields: Vec<PendingField>,
    discriminator: Option<Discriminator>,
    factory: FactoryFn,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeMetadataBuilder<T> {
    /// Overrides the bare-allocation factory.
    ///
    /// Useful when a type id maps onto a variant of a shared Rust type, e.g.
    /// registering `"Dog"` as `|| Animal::Dog(Dog::default())`.
    pub fn factory(mut self, factory: fn() -> T) -> Self {
        self.factory = Box::new(move || Box::new(factory()) as Box<dyn Any>);
        self
    }

    /// Registers a field. The data mapping is probed under the field name;
    /// `signature` follows the declared-type grammar and may be empty for an
    /// untyped field.
    pub fn field(
        self,
        name: impl Into<String>,
        signature: impl Into<String>,
        access: FieldAccess,
    ) -> Self {
        self.push_field(name.into(), None, signature.into(), access)
    }

    /// Registers a field whose value is read from `source` in the data
    /// mapping instead of the field name.
    pub fn field_mapped(
        self,
        name: impl Into<String>,
        source: impl Into<String>,
        signature: impl Into<String>,
        access: FieldAccess,
    ) -> Self {
        self.push_field(name.into(), Some(source.into()), signature.into(), access)
    }

    fn push_field(
        mut self,
        name: String,
        source: Option<String>,
        signature: String,
        access: FieldAccess,
    ) -> Self {
        self.fields.push(PendingField {
            name,
            source,
            signature,
            access,
        });
        self
    }

    /// Attaches a discriminator: when `field` is present in the data, its
    /// value selects the concrete type id from `map`.
    pub fn discriminator<I, K, V>(mut self, field: impl Into<String>, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.discriminator = Some(Discriminator {
            field: field.into(),
            map: map
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        });
        self
    }

    /// Parses all declared signatures and produces the immutable metadata.
    pub fn build(self) -> Result<TypeMetadata, SignatureError> {
        let mut fields = Vec::with_capacity(self.fields.len());

        for pending in self.fields {
            fields.push(FieldDescriptor {
                signature: TypeSignature::parse(&pending.signature)?,
                name: pending.name,
                source: pending.source,
                access: pending.access,
            });
        }

        Ok(TypeMetadata {
            type_id: self.type_id,
            rust_type: TypeId::of::<T>(),
            fields,
            discriminator: self.discriminator,
            factory: self.factory,
            collect: Box::new(|items| {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(*item.downcast::<T>().ok()?);
                }
                Some(Box::new(out) as Box<dyn Any>)
            }),
        })
    }
}

/// The process-wide table of registered types.
///
/// Registration happens up front; afterwards the registry is read-only and
/// safe to share across threads.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_id: HashMap<String, TypeMetadata>,
    by_rust_type: HashMap<TypeId, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any previous metadata under the same id.
    ///
    /// The first registration for a given Rust type wins the runtime-type
    /// index used by [`TypeRegistry::of`], so register a family's root type
    /// before aliases that share its Rust representation.
    pub fn register(&mut self, metadata: TypeMetadata) {
        tracing::debug!(type_id = %metadata.type_id, "registering type metadata");
        self.by_rust_type
            .entry(metadata.rust_type)
            .or_insert_with(|| metadata.type_id.clone());
        self.by_id.insert(metadata.type_id.clone(), metadata);
    }

    /// Looks up metadata by registered type id.
    pub fn get(&self, type_id: &str) -> Option<&TypeMetadata> {
        self.by_id.get(type_id)
    }

    /// Looks up metadata for the runtime type of `obj`.
    pub fn of(&self, obj: &dyn Any) -> Option<&TypeMetadata> {
        self.by_rust_type
            .get(&obj.type_id())
            .and_then(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pet {
        name: String,
        age: i64,
    }

    fn pet_metadata() -> TypeMetadata {
        TypeMetadata::builder::<Pet>("Pet")
            .field(
                "name",
                "string",
                FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name),
            )
            .field_mapped(
                "age",
                "pet_age",
                "int",
                FieldAccess::direct(|p: &Pet| &p.age, |p: &mut Pet| &mut p.age),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_source_key_override() {
        let metadata = pet_metadata();
        assert_eq!(metadata.field("name").unwrap().source_key(), "name");
        assert_eq!(metadata.field("age").unwrap().source_key(), "pet_age");
    }

    #[test]
    fn test_registry_lookup_by_id_and_runtime_type() {
        let mut registry = TypeRegistry::new();
        registry.register(pet_metadata());

        assert!(registry.get("Pet").is_some());
        assert!(registry.get("Owner").is_none());

        let pet = Pet::default();
        let metadata = registry.of(&pet).expect("runtime lookup should resolve");
        assert_eq!(metadata.type_id(), "Pet");
    }

    #[test]
    fn test_allocate_produces_bare_instance() {
        let metadata = pet_metadata();
        let instance = metadata.allocate();
        let pet = instance.downcast::<Pet>().unwrap();
        assert_eq!(pet.name, "");
        assert_eq!(pet.age, 0);
    }

    #[test]
    fn test_factory_override() {
        let metadata = TypeMetadata::builder::<Pet>("OldPet")
            .factory(|| Pet {
                name: String::new(),
                age: 7,
            })
            .build()
            .unwrap();

        let pet = metadata.allocate().downcast::<Pet>().unwrap();
        assert_eq!(pet.age, 7);
    }

    #[test]
    fn test_invalid_signature_fails_at_build() {
        let result = TypeMetadata::builder::<Pet>("Pet")
            .field(
                "name",
                "map<Pet>",
                FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name),
            )
            .build();

        assert!(matches!(
            result,
            Err(SignatureError::UnknownDecoration { .. })
        ));
    }

    #[test]
    fn test_discriminator_resolution() {
        let metadata = TypeMetadata::builder::<Pet>("Animal")
            .discriminator("kind", [("dog", "Dog"), ("cat", "Cat")])
            .build()
            .unwrap();

        let discriminator = metadata.discriminator().unwrap();
        assert_eq!(discriminator.resolve("dog"), Some("Dog"));
        assert_eq!(discriminator.resolve("fish"), None);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeRegistry>();
    }
}
