//! Metadata-driven hydration of typed object graphs from untyped data.
//!
//! Types are registered once in a [`TypeRegistry`] with per-field declared
//! types and access capabilities; the [`Hydrator`] then populates instances
//! from `serde_json::Value` mappings, recursing through nested objects,
//! collections, and discriminator-resolved polymorphic families. The
//! [`PropertyAccessor`] reads and writes fields on registered objects by
//! dotted path.
//!
//! ## Example
//!
//! ```
//! use imbue::{FieldAccess, Hydrator, PropertyAccessor, TypeMetadata, TypeRegistry};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Pet {
//!     name: String,
//! }
//!
//! #[derive(Default)]
//! struct Owner {
//!     name: String,
//!     pet: Pet,
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(
//!     TypeMetadata::builder::<Pet>("Pet")
//!         .field("name", "string", FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name))
//!         .build()?,
//! );
//! registry.register(
//!     TypeMetadata::builder::<Owner>("Owner")
//!         .field("name", "string", FieldAccess::direct(|o: &Owner| &o.name, |o: &mut Owner| &mut o.name))
//!         .field("pet", "Pet", FieldAccess::direct(|o: &Owner| &o.pet, |o: &mut Owner| &mut o.pet))
//!         .build()?,
//! );
//!
//! let mut owner = Owner::default();
//! Hydrator::new(&registry).hydrate(
//!     &mut owner,
//!     &json!({"name": "ada", "pet": {"name": "rex"}}),
//! )?;
//!
//! let accessor = PropertyAccessor::new(&registry);
//! assert_eq!(accessor.get_as::<String>(&owner, "pet.name")?, "rex");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod access;
pub mod hydrate;
pub mod metadata;
mod error;

pub use access::{AccessError, PropertyAccessor};
pub use error::Error;
pub use hydrate::{HydrateError, Hydrator, DEFAULT_MAX_DEPTH};
pub use metadata::{
    Discriminator, FieldAccess, FieldDescriptor, NativeKind, SignatureError, TypeMetadata,
    TypeMetadataBuilder, TypeRegistry, TypeSignature,
};
