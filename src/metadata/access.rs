//! Field access capabilities.
//!
//! Every registered field carries one capability, resolved once at
//! registration: either direct borrow access to a struct field, or a pair of
//! accessor methods. Both are stored type-erased over `dyn Any` so the
//! hydrator and the property accessor stay generic over object shapes.

use std::any::Any;

use crate::access::AccessError;

type GetFn = Box<dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync>;
type GetMutFn = Box<dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync>;
type SetFn = Box<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<(), CapabilityError> + Send + Sync>;

/// A capability failure, contextualized with the field name by the caller.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CapabilityError {
    /// The object the capability was applied to is not the registered type.
    Receiver,
    /// The written value could not be downcast to the field's type.
    Value,
}

impl CapabilityError {
    pub(crate) fn for_field(self, field: &str) -> AccessError {
        match self {
            Self::Receiver => AccessError::ReceiverMismatch {
                field: field.to_string(),
            },
            Self::Value => AccessError::ValueMismatch {
                field: field.to_string(),
            },
        }
    }
}

/// How a field is read and written.
pub enum FieldAccess {
    /// Plain struct field: borrow getters, setter derived from the mutable
    /// borrow.
    Direct {
        get: GetFn,
        get_mut: GetMutFn,
        set: SetFn,
    },
    /// Method-backed field: a getter invoked with no arguments and a setter
    /// invoked with the value. No mutable traversal through these.
    Accessor { get: GetFn, set: SetFn },
}

impl FieldAccess {
    /// Direct field access from a pair of borrow functions.
    ///
    /// ## Example
    ///
    /// ```
    /// use imbue::FieldAccess;
    ///
    /// struct Pet { name: String }
    ///
    /// let access = FieldAccess::direct(
    ///     |p: &Pet| &p.name,
    ///     |p: &mut Pet| &mut p.name,
    /// );
    /// assert_eq!(access.kind(), "direct");
    /// ```
    pub fn direct<T, V>(
        get: for<'a> fn(&'a T) -> &'a V,
        get_mut: for<'a> fn(&'a mut T) -> &'a mut V,
    ) -> Self
    where
        T: 'static,
        V: 'static,
    {
        Self::Direct {
            get: Box::new(move |obj| Some(get(obj.downcast_ref::<T>()?) as &dyn Any)),
            get_mut: Box::new(move |obj| Some(get_mut(obj.downcast_mut::<T>()?) as &mut dyn Any)),
            set: Box::new(move |obj, value| {
                let target = obj.downcast_mut::<T>().ok_or(CapabilityError::Receiver)?;
                let value = value.downcast::<V>().map_err(|_| CapabilityError::Value)?;
                *get_mut(target) = *value;
                Ok(())
            }),
        }
    }

    /// Method-backed access from a getter returning a borrow and a setter
    /// taking the value, e.g. `FieldAccess::accessor(Pet::name, Pet::set_name)`.
    pub fn accessor<T, V>(get: for<'a> fn(&'a T) -> &'a V, set: fn(&mut T, V)) -> Self
    where
        T: 'static,
        V: 'static,
    {
        Self::Accessor {
            get: Box::new(move |obj| Some(get(obj.downcast_ref::<T>()?) as &dyn Any)),
            set: Box::new(move |obj, value| {
                let target = obj.downcast_mut::<T>().ok_or(CapabilityError::Receiver)?;
                let value = value.downcast::<V>().map_err(|_| CapabilityError::Value)?;
                set(target, *value);
                Ok(())
            }),
        }
    }

    pub(crate) fn get<'a>(&self, obj: &'a dyn Any) -> Option<&'a dyn Any> {
        match self {
            Self::Direct { get, .. } | Self::Accessor { get, .. } => get(obj),
        }
    }

    pub(crate) fn get_mut<'a>(&self, obj: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        match self {
            Self::Direct { get_mut, .. } => Some(get_mut(obj)),
            Self::Accessor { .. } => None,
        }
    }

    pub(crate) fn set(
        &self,
        obj: &mut dyn Any,
        value: Box<dyn Any>,
    ) -> Result<(), CapabilityError> {
        match self {
            Self::Direct { set, .. } | Self::Accessor { set, .. } => set(obj, value),
        }
    }

    /// Capability kind as a short label, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Accessor { .. } => "accessor",
        }
    }
}

impl std::fmt::Debug for FieldAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FieldAccess").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pet {
        name: String,
    }

    impl Pet {
        fn name(&self) -> &String {
            &self.name
        }

        fn set_name(&mut self, name: String) {
            self.name = name.to_uppercase();
        }
    }

    #[test]
    fn test_direct_roundtrip() {
        let access = FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name);
        let mut pet = Pet::default();

        access
            .set(&mut pet, Box::new("rex".to_string()))
            .expect("set should succeed");
        let name = access.get(&pet).unwrap().downcast_ref::<String>().unwrap();
        assert_eq!(name, "rex");
    }

    #[test]
    fn test_accessor_invokes_setter() {
        let access = FieldAccess::accessor(Pet::name, Pet::set_name);
        let mut pet = Pet::default();

        access
            .set(&mut pet, Box::new("rex".to_string()))
            .expect("set should succeed");
        assert_eq!(pet.name, "REX");
    }

    #[test]
    fn test_receiver_mismatch() {
        let access = FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name);
        let mut not_a_pet = 42_i64;

        let err = access
            .set(&mut not_a_pet, Box::new("rex".to_string()))
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Receiver));
    }

    #[test]
    fn test_value_mismatch() {
        let access = FieldAccess::direct(|p: &Pet| &p.name, |p: &mut Pet| &mut p.name);
        let mut pet = Pet::default();

        let err = access.set(&mut pet, Box::new(42_i64)).unwrap_err();
        assert!(matches!(err, CapabilityError::Value));
    }
}
