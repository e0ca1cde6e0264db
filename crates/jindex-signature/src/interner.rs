use lasso::{Rodeo, Spur};
use serde::{Deserialize, Serialize};

/// Interned raw type identity: the field descriptor of an erased type
/// (`I`, `Ljava/lang/String;`, `[Ljava/util/List;`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(Spur);

/// Owns every raw type identity. Structurally identical descriptors always
/// intern to the same [`TypeId`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TypeInterner {
    rodeo: Rodeo,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, descriptor: &str) -> TypeId {
        TypeId(self.rodeo.get_or_intern(descriptor))
    }

    /// Looks up a descriptor without interning it.
    pub fn get(&self, descriptor: &str) -> Option<TypeId> {
        self.rodeo.get(descriptor).map(TypeId)
    }

    pub fn resolve(&self, id: TypeId) -> &str {
        self.rodeo.resolve(&id.0)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}
