//! Declared type signatures and their parser.
//!
//! Fields are registered with a small string grammar — either a bare
//! identifier (`"int"`, `"string"`, `"Pet"`, ...) or a decorated form
//! `outer<inner>` where `outer` is `array` (collection of objects) or a date
//! kind (date with an explicit format). The string is parsed once at
//! registration into a [`TypeSignature`]; hydration never re-parses it.

use thiserror::Error;

/// Error raised while parsing a declared type signature at registration time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignatureError {
    #[error("malformed type signature '{0}'")]
    Malformed(String),

    #[error("unknown decoration '{outer}' in signature '{signature}'")]
    UnknownDecoration { outer: String, signature: String },
}

/// The fixed set of native scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Int,
    Float,
    Bool,
    Str,
    Array,
    Date,
}

/// A declared field type, parsed from the registration grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    /// A native scalar (`int`, `string`, `bool`, `float`, `array`, `date`).
    Native(NativeKind),
    /// `array<T>` — an ordered collection of objects of the named type.
    Collection(String),
    /// `date<FMT>` / `datetime<FMT>` — a date parsed with an explicit
    /// chrono format string.
    DateFormat(String),
    /// Anything else — a nested object of the named registered type.
    Object(String),
}

impl TypeSignature {
    /// Parses a declared type signature.
    ///
    /// An empty (or all-whitespace) signature is valid and yields `None`:
    /// the field is untyped and hydration assigns raw values to it without
    /// conversion.
    pub fn parse(raw: &str) -> Result<Option<Self>, SignatureError> {
        let raw = raw.trim();

        if raw.is_empty() {
            return Ok(None);
        }

        if raw.contains('<') || raw.contains('>') {
            return parse_decorated(raw).map(Some);
        }

        Ok(Some(match raw {
            "int" | "integer" => Self::Native(NativeKind::Int),
            "float" => Self::Native(NativeKind::Float),
            "bool" | "boolean" => Self::Native(NativeKind::Bool),
            "string" => Self::Native(NativeKind::Str),
            "array" => Self::Native(NativeKind::Array),
            "date" | "datetime" => Self::Native(NativeKind::Date),
            other => Self::Object(other.to_string()),
        }))
    }
}

/// Parses the `outer<inner>` form. A single bracket pair only — nested
/// angle brackets are not part of the grammar.
fn parse_decorated(raw: &str) -> Result<TypeSignature, SignatureError> {
    let malformed = || SignatureError::Malformed(raw.to_string());

    let open = raw.find('<').ok_or_else(malformed)?;
    let close = raw.rfind('>').ok_or_else(malformed)?;

    if close != raw.len() - 1 || open == 0 {
        return Err(malformed());
    }

    let outer = &raw[..open];
    let inner = &raw[open + 1..close];

    if inner.is_empty() || inner.contains('<') || inner.contains('>') {
        return Err(malformed());
    }

    match outer {
        "array" => Ok(TypeSignature::Collection(inner.to_string())),
        "date" | "datetime" => Ok(TypeSignature::DateFormat(inner.to_string())),
        other => Err(SignatureError::UnknownDecoration {
            outer: other.to_string(),
            signature: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signature_is_untyped() {
        assert_eq!(TypeSignature::parse("").unwrap(), None);
        assert_eq!(TypeSignature::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_native_kinds() {
        assert_eq!(
            TypeSignature::parse("int").unwrap(),
            Some(TypeSignature::Native(NativeKind::Int))
        );
        assert_eq!(
            TypeSignature::parse("integer").unwrap(),
            Some(TypeSignature::Native(NativeKind::Int))
        );
        assert_eq!(
            TypeSignature::parse("boolean").unwrap(),
            Some(TypeSignature::Native(NativeKind::Bool))
        );
        assert_eq!(
            TypeSignature::parse("datetime").unwrap(),
            Some(TypeSignature::Native(NativeKind::Date))
        );
        assert_eq!(
            TypeSignature::parse("array").unwrap(),
            Some(TypeSignature::Native(NativeKind::Array))
        );
    }

    #[test]
    fn test_object_signature() {
        assert_eq!(
            TypeSignature::parse("Pet").unwrap(),
            Some(TypeSignature::Object("Pet".to_string()))
        );
    }

    #[test]
    fn test_collection_signature() {
        assert_eq!(
            TypeSignature::parse("array<Pet>").unwrap(),
            Some(TypeSignature::Collection("Pet".to_string()))
        );
    }

    #[test]
    fn test_date_format_signature() {
        assert_eq!(
            TypeSignature::parse("date<%d/%m/%Y>").unwrap(),
            Some(TypeSignature::DateFormat("%d/%m/%Y".to_string()))
        );
    }

    #[test]
    fn test_unknown_decoration() {
        let err = TypeSignature::parse("map<Pet>").unwrap_err();
        assert!(matches!(
            err,
            SignatureError::UnknownDecoration { ref outer, .. } if outer == "map"
        ));
    }

    #[test]
    fn test_malformed_signatures() {
        for raw in ["<Pet>", "array<", "array>Pet<", "array<>", "array<a<b>>"] {
            assert!(
                matches!(TypeSignature::parse(raw), Err(SignatureError::Malformed(_))),
                "expected '{raw}' to be malformed"
            );
        }
    }
}
