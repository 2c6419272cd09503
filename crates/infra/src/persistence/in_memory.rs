use std::collections::HashMap;
use std::sync::RwLock;

use storefront_core::{CategoryId, Entity, OrderId, ProductId, UserId};
use storefront_orders::Order;
use storefront_products::{Product, ProductCategory};
use storefront_users::User;

use super::r#trait::{Facade, PersistenceError, ProductCriteria, StoredOrder};

/// In-memory persistence facade.
///
/// Intended for tests/dev. Placed orders are kept as JSON documents, the same
/// shape a document store would receive.
#[derive(Debug, Default)]
pub struct InMemoryFacade {
    products: RwLock<HashMap<ProductId, Product>>,
    categories: RwLock<HashMap<CategoryId, ProductCategory>>,
    orders: RwLock<HashMap<OrderId, StoredOrder>>,
    users: RwLock<HashMap<UserId, User>>,
}

fn poisoned() -> PersistenceError {
    PersistenceError::Unavailable("lock poisoned".to_string())
}

fn upsert<E: Entity>(table: &RwLock<HashMap<E::Id, E>>, entity: E) -> Result<(), PersistenceError> {
    let mut rows = table.write().map_err(|_| poisoned())?;
    rows.insert(entity.id().clone(), entity);
    Ok(())
}

fn fetch<E: Entity + Clone>(
    table: &RwLock<HashMap<E::Id, E>>,
    kind: &'static str,
    id: &E::Id,
) -> Result<E, PersistenceError> {
    let rows = table.read().map_err(|_| poisoned())?;
    rows.get(id)
        .cloned()
        .ok_or_else(|| PersistenceError::not_found(kind, id))
}

impl InMemoryFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a catalog product.
    pub fn insert_product(&self, product: Product) -> Result<(), PersistenceError> {
        upsert(&self.products, product)
    }

    /// Seed or replace a catalog category.
    pub fn insert_category(&self, category: ProductCategory) -> Result<(), PersistenceError> {
        upsert(&self.categories, category)
    }

    fn categories_where(
        &self,
        keep: impl Fn(&ProductCategory) -> bool,
    ) -> Result<Vec<ProductCategory>, PersistenceError> {
        let categories = self.categories.read().map_err(|_| poisoned())?;
        let mut matching: Vec<ProductCategory> =
            categories.values().filter(|c| keep(*c)).cloned().collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(matching)
    }

    pub fn stored_order_count(&self) -> Result<usize, PersistenceError> {
        Ok(self.orders.read().map_err(|_| poisoned())?.len())
    }
}

impl Facade for InMemoryFacade {
    fn load_product(&self, id: ProductId) -> Result<Product, PersistenceError> {
        fetch(&self.products, "product", &id)
    }

    fn query_products(&self, criteria: &ProductCriteria) -> Result<Vec<Product>, PersistenceError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(matching)
    }

    fn query_root_categories(&self) -> Result<Vec<ProductCategory>, PersistenceError> {
        self.categories_where(ProductCategory::is_root)
    }

    fn query_subcategories(&self, parent: CategoryId) -> Result<Vec<ProductCategory>, PersistenceError> {
        self.categories_where(|c| c.parent() == Some(parent))
    }

    fn store_order(&self, order: &Order, user_id: Option<UserId>) -> Result<StoredOrder, PersistenceError> {
        let stored = StoredOrder::from_order(order, user_id)?;
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        if orders.contains_key(&stored.order_id) {
            return Err(PersistenceError::Conflict(format!(
                "order {} already stored",
                stored.order_id
            )));
        }
        orders.insert(stored.order_id, stored.clone());
        tracing::debug!(order_id = %stored.order_id, "order stored");
        Ok(stored)
    }

    fn load_order(&self, id: OrderId) -> Result<Order, PersistenceError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        orders
            .get(&id)
            .ok_or_else(|| PersistenceError::not_found("order", id))?
            .to_order()
    }

    fn store_user(&self, user: &User) -> Result<(), PersistenceError> {
        upsert(&self.users, user.clone())
    }

    fn load_user(&self, id: UserId) -> Result<User, PersistenceError> {
        fetch(&self.users, "user", &id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{Currency, Money};

    fn eur(minor_units: i64) -> Money {
        Money::new(minor_units, Currency::Eur)
    }

    fn seeded() -> (InMemoryFacade, Vec<Product>) {
        let facade = InMemoryFacade::new();
        let mut sold_out = Product::new(ProductId::new(), "Gizmo", eur(5000));
        sold_out.set_available(false);
        let products = vec![
            Product::new(ProductId::new(), "Widget", eur(1000)),
            Product::new(ProductId::new(), "Gadget", eur(250)),
            sold_out,
        ];
        for p in &products {
            facade.insert_product(p.clone()).unwrap();
        }
        (facade, products)
    }

    #[test]
    fn load_missing_product_is_not_found() {
        let facade = InMemoryFacade::new();
        let id = ProductId::new();
        assert_eq!(
            facade.load_product(id).unwrap_err(),
            PersistenceError::not_found("product", id)
        );
    }

    #[test]
    fn query_filters_and_sorts_by_name() {
        let (facade, _) = seeded();

        let all: Vec<_> = facade
            .query_products(&ProductCriteria::default())
            .unwrap()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(all, ["Gadget", "Gizmo", "Widget"]);

        let available = facade.query_products(&ProductCriteria::available()).unwrap();
        assert_eq!(available.len(), 2);

        let cheap = facade
            .query_products(&ProductCriteria {
                max_price: Some(eur(999)),
                ..ProductCriteria::default()
            })
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].name(), "Gadget");

        let named = facade
            .query_products(&ProductCriteria {
                name_contains: Some("GA".into()),
                available_only: true,
                ..ProductCriteria::default()
            })
            .unwrap();
        assert_eq!(named.len(), 1);
    }

    #[test]
    fn orders_are_stored_once_and_reload_intact() {
        let (facade, products) = seeded();
        let mut order = Order::new(OrderId::new(), Currency::Eur);
        order.add_product(&products[0], 2).unwrap();
        let user = UserId::new();

        let stored = facade.store_order(&order, Some(user)).unwrap();
        assert_eq!(stored.user_id, Some(user));
        assert_eq!(facade.load_order(order.id_typed()).unwrap(), order);

        assert!(matches!(
            facade.store_order(&order, Some(user)),
            Err(PersistenceError::Conflict(_))
        ));
        assert_eq!(facade.stored_order_count().unwrap(), 1);
    }

    #[test]
    fn tampered_order_document_is_a_serialization_error() {
        let (_, products) = seeded();
        let mut order = Order::new(OrderId::new(), Currency::Eur);
        order.add_product(&products[0], 2).unwrap();
        let mut stored = StoredOrder::from_order(&order, None).unwrap();
        let line = stored.payload["lines"][0].clone();
        stored.payload["lines"].as_array_mut().unwrap().push(line);

        assert!(matches!(stored.to_order(), Err(PersistenceError::Serialization(_))));

        stored.payload["lines"].as_array_mut().unwrap().pop();
        stored.payload["lines"][0]["quantity"] = serde_json::json!(0);
        assert!(matches!(stored.to_order(), Err(PersistenceError::Serialization(_))));
    }

    #[test]
    fn root_categories_and_children_are_listed_by_name() {
        let facade = InMemoryFacade::new();
        let tools = ProductCategory::root(CategoryId::new(), "Tools");
        let garden = ProductCategory::root(CategoryId::new(), "Garden");
        let saws = ProductCategory::child(CategoryId::new(), "Saws", tools.id_typed());
        for c in [&tools, &garden, &saws] {
            facade.insert_category(c.clone()).unwrap();
        }

        let roots: Vec<_> = facade
            .query_root_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(roots, ["Garden", "Tools"]);
        assert_eq!(facade.query_subcategories(tools.id_typed()).unwrap(), vec![saws]);
        assert!(facade.query_subcategories(garden.id_typed()).unwrap().is_empty());
    }

    #[test]
    fn category_criterion_lists_only_that_category() {
        let facade = InMemoryFacade::new();
        let tools = CategoryId::new();
        let hammer = Product::new(ProductId::new(), "Hammer", eur(1500)).with_category(tools);
        let mut retired = Product::new(ProductId::new(), "Mallet", eur(900)).with_category(tools);
        retired.set_available(false);
        facade.insert_product(hammer.clone()).unwrap();
        facade.insert_product(retired).unwrap();
        facade
            .insert_product(Product::new(ProductId::new(), "Rake", eur(1200)))
            .unwrap();

        let listed = facade.query_products(&ProductCriteria::in_category(tools)).unwrap();
        assert_eq!(listed, vec![hammer]);
    }

    #[test]
    fn store_user_replaces_profile() {
        let facade = InMemoryFacade::new();
        let mut user = User::new(UserId::new(), "Kim");
        facade.store_user(&user).unwrap();

        user.city = Some("Turku".into());
        facade.store_user(&user).unwrap();

        assert_eq!(facade.load_user(user.id).unwrap().city.as_deref(), Some("Turku"));
    }
}
