use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, Currency, Entity, Money, ProductId};

/// A sellable catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    /// Unit price in the currency's minor unit.
    price: Money,
    available: bool,
    #[serde(default)]
    category: Option<CategoryId>,
}

impl Product {
    /// Create an available product.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            available: true,
            category: None,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn currency(&self) -> Currency {
        self.price.currency()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// The category the product is listed under, if any.
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_products_are_available() {
        let product = Product::new(ProductId::new(), "Widget", Money::new(1000, Currency::Eur));
        assert!(product.is_available());
        assert_eq!(product.currency(), Currency::Eur);
    }

    #[test]
    fn repricing_keeps_identity() {
        let widget = Product::new(ProductId::new(), "Widget", Money::new(1000, Currency::Eur));
        let repriced = widget.clone().with_price(Money::new(1200, Currency::Eur));

        assert!(widget.same_entity(&repriced));
        assert_ne!(widget, repriced);
    }

    #[test]
    fn product_serializes_price_with_currency_code() {
        let mut product = Product::new(ProductId::new(), "Widget", Money::new(1999, Currency::Usd));
        product.set_available(false);

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"]["minor_units"], 1999);
        assert_eq!(json["price"]["currency"], "USD");
        assert_eq!(json["available"], false);
    }

    #[test]
    fn documents_without_category_still_load() {
        let product = Product::new(ProductId::new(), "Widget", Money::new(1000, Currency::Eur));
        let mut json = serde_json::to_value(&product).unwrap();
        json.as_object_mut().unwrap().remove("category");

        let restored: Product = serde_json::from_value(json).unwrap();
        assert_eq!(restored.category(), None);
        assert_eq!(restored, product);
    }
}
