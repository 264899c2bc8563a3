//! The SRC type model.
//!
//! The loader attaches these to declarations and to the expression nodes
//! where emission needs a type fact: integer width and signedness for
//! overflow masking, map key kind for key boxing, named-type identity for
//! runtime type tags.

use serde::{Deserialize, Serialize};

use crate::def::DefId;

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: SrcType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SrcType {
    Bool,
    /// Sized integer. `width` is one of 8, 16, 32, 64.
    Int { width: u8, signed: bool },
    Float { width: u8 },
    String,
    Slice { elem: Box<SrcType> },
    Array { elem: Box<SrcType>, len: u64 },
    Map { key: Box<SrcType>, value: Box<SrcType> },
    Struct { fields: Vec<Field> },
    Interface { methods: Vec<String> },
    Pointer { elem: Box<SrcType> },
    Func,
    Chan { elem: Box<SrcType> },
    /// Reference to a named type declaration.
    Named { id: DefId },
}

impl SrcType {
    pub fn int(width: u8, signed: bool) -> Self {
        Self::Int { width, signed }
    }

    /// The empty interface: satisfied by every type.
    pub fn any() -> Self {
        Self::Interface { methods: vec![] }
    }

    pub fn slice_of(elem: SrcType) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn pointer_to(elem: SrcType) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    /// True for map key types that are JS-native property keys. Any other
    /// key type is boxed by the emitted runtime.
    pub fn is_native_map_key(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Int { .. } | Self::Float { .. } | Self::Bool
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_map_keys() {
        assert!(SrcType::String.is_native_map_key());
        assert!(SrcType::int(32, true).is_native_map_key());
        assert!(!SrcType::slice_of(SrcType::Bool).is_native_map_key());
        assert!(
            !SrcType::Named {
                id: DefId::new("p.T")
            }
            .is_native_map_key()
        );
    }

    #[test]
    fn type_json_shape_is_tagged() {
        let ty = SrcType::slice_of(SrcType::int(8, false));
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "slice");
        assert_eq!(json["elem"]["kind"], "int");
        assert_eq!(json["elem"]["width"], 8);
    }
}
