use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, Entity};

/// A node of the catalog tree. Root categories are the top-level entries the
/// storefront navigation starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    id: CategoryId,
    name: String,
    parent: Option<CategoryId>,
}

impl ProductCategory {
    pub fn root(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
        }
    }

    pub fn child(id: CategoryId, name: impl Into<String>, parent: CategoryId) -> Self {
        Self {
            id,
            name: name.into(),
            parent: Some(parent),
        }
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl Entity for ProductCategory {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent() {
        let tools = ProductCategory::root(CategoryId::new(), "Tools");
        let saws = ProductCategory::child(CategoryId::new(), "Saws", tools.id_typed());

        assert!(tools.is_root());
        assert!(!saws.is_root());
        assert_eq!(saws.parent(), Some(tools.id_typed()));
    }
}
