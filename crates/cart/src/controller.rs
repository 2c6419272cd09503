//! Stateless façade between storefront views and the cart.
//!
//! Views call the controller with ids and raw quantities; the controller
//! resolves products through the persistence facade, forwards to the
//! [`ShoppingCart`] and renders amounts with the configured formatter.

use serde::Serialize;
use thiserror::Error;

use storefront_core::{CategoryId, ProductId};
use storefront_infra::{Facade, PersistenceError, ProductCriteria};
use storefront_orders::{Order, OrderedProduct};
use storefront_products::{Product, ProductCategory};

use crate::cart::{CartError, ShoppingCart};
use crate::format::{LocaleFormatter, MoneyFormatter};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Everything a cart view needs to render itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: String,
    pub lines: Vec<LineSummary>,
    pub checkout_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct CartController<F, M = LocaleFormatter> {
    facade: F,
    formatter: M,
}

impl<F: Facade> CartController<F> {
    pub fn new(facade: F) -> Self {
        Self::with_formatter(facade, LocaleFormatter::default())
    }
}

impl<F: Facade, M: MoneyFormatter> CartController<F, M> {
    pub fn with_formatter(facade: F, formatter: M) -> Self {
        Self { facade, formatter }
    }

    pub fn facade(&self) -> &F {
        &self.facade
    }

    pub fn formatted_total_price(&self, order: &Order) -> String {
        self.formatter.format(order.total_price())
    }

    pub fn formatted_line_total(&self, line: &OrderedProduct) -> String {
        self.formatter.format(line.line_total())
    }

    pub fn formatted_price(&self, product: &Product) -> String {
        self.formatter.format(product.price())
    }

    pub fn summary(&self, order: &Order) -> CartSummary {
        let lines = order
            .ordered_products()
            .iter()
            .map(|line| LineSummary {
                product_id: line.product_id(),
                name: line.product().name().to_owned(),
                quantity: line.quantity(),
                unit_price: self.formatted_price(line.product()),
                line_total: self.formatted_line_total(line),
            })
            .collect();

        CartSummary {
            item_count: order.item_count(),
            total: self.formatted_total_price(order),
            lines,
            checkout_enabled: !order.is_empty(),
        }
    }

    /// Catalogue listing for the product views.
    pub fn browse(&self, criteria: &ProductCriteria) -> Result<Vec<Product>, ControllerError> {
        Ok(self.facade.query_products(criteria)?)
    }

    /// Top-level categories the catalogue navigation starts from.
    pub fn root_categories(&self) -> Result<Vec<ProductCategory>, ControllerError> {
        Ok(self.facade.query_root_categories()?)
    }

    pub fn subcategories(&self, parent: CategoryId) -> Result<Vec<ProductCategory>, ControllerError> {
        Ok(self.facade.query_subcategories(parent)?)
    }

    /// Available products listed under `category`.
    pub fn browse_category(&self, category: CategoryId) -> Result<Vec<Product>, ControllerError> {
        self.browse(&ProductCriteria::in_category(category))
    }

    pub fn add_product_by_id(
        &self,
        cart: &ShoppingCart,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<OrderedProduct, ControllerError> {
        let product = self.facade.load_product(product_id)?;
        Ok(cart.add_to_cart(&product, quantity)?)
    }

    /// Set the quantity of a product by id; `quantity <= 0` removes the line
    /// without touching the catalogue.
    pub fn update_quantity_by_id(
        &self,
        cart: &ShoppingCart,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<OrderedProduct>, ControllerError> {
        if quantity <= 0 {
            cart.remove_from_cart(product_id)?;
            return Ok(None);
        }
        let product = self.facade.load_product(product_id)?;
        Ok(cart.update_quantity(&product, quantity)?)
    }

    pub fn remove_by_id(&self, cart: &ShoppingCart, product_id: ProductId) -> Result<bool, ControllerError> {
        Ok(cart.remove_from_cart(product_id)?)
    }
}
