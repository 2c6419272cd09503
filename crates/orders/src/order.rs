use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::money::MoneyError;
use storefront_core::{AggregateRoot, Currency, Money, OrderId, ProductId};
use storefront_products::Product;

/// Rejected order mutation. A rejected mutation leaves the order unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity must be positive where the call is not a removal.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("currency mismatch: order is in {expected}, product is priced in {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("product is not available: {0}")]
    ProductUnavailable(ProductId),

    /// A quantity or amount would leave the representable range.
    #[error("amount overflow")]
    AmountOverflow,

    /// A restored order listed the same product on more than one line.
    #[error("duplicate line for product {0}")]
    DuplicateLine(ProductId),
}

impl From<MoneyError> for OrderError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyMismatch { expected, found } => {
                OrderError::CurrencyMismatch { expected, found }
            }
            MoneyError::Overflow => OrderError::AmountOverflow,
        }
    }
}

/// Line item: a product copy and how many of it are ordered.
///
/// `quantity` is always at least 1; a line reduced to zero is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProduct {
    product: Product,
    quantity: u32,
}

impl OrderedProduct {
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id_typed()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        // Every committed line was checked against overflow.
        self.product.price().saturating_mul(self.quantity)
    }
}

/// Aggregate root: the shopping cart of one session.
///
/// # Invariants
/// - At most one line per product id.
/// - Every line quantity is ≥ 1.
/// - Every line is priced in the order's currency.
/// - The grand total fits in the money representation.
///
/// Deserialization re-checks all of them; a document that violates one is
/// rejected rather than restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderDocument")]
pub struct Order {
    id: OrderId,
    currency: Currency,
    lines: Vec<OrderedProduct>,
    version: u64,
}

/// Wire shape of an [`Order`], trusted only after validation.
#[derive(Deserialize)]
struct OrderDocument {
    id: OrderId,
    currency: Currency,
    lines: Vec<OrderedProduct>,
    version: u64,
}

impl TryFrom<OrderDocument> for Order {
    type Error = OrderError;

    fn try_from(doc: OrderDocument) -> Result<Self, Self::Error> {
        let mut order = Order::new(doc.id, doc.currency);
        let mut seen = HashSet::with_capacity(doc.lines.len());
        for line in &doc.lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity(0));
            }
            order.ensure_currency(&line.product)?;
            if !seen.insert(line.product_id()) {
                return Err(OrderError::DuplicateLine(line.product_id()));
            }
        }
        order.commit(doc.lines)?;
        order.version = doc.version;
        Ok(order)
    }
}

impl Order {
    pub fn new(id: OrderId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            lines: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Line items in insertion order.
    pub fn ordered_products(&self) -> &[OrderedProduct] {
        &self.lines
    }

    pub fn line(&self, product_id: ProductId) -> Option<&OrderedProduct> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Σ(quantity × unit price), recomputed on every call.
    pub fn total_price(&self) -> Money {
        let minor_units = self
            .lines
            .iter()
            .map(|l| l.line_total().minor_units())
            .fold(0i64, i64::saturating_add);
        Money::new(minor_units, self.currency)
    }

    /// Add `quantity` of `product`, merging into an existing line if present.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
    ) -> Result<&OrderedProduct, OrderError> {
        let quantity = positive_quantity(quantity)?;
        self.ensure_currency(product)?;

        let mut lines = self.lines.clone();
        let index = match self.position(product.id_typed()) {
            Some(index) => {
                let merged = lines[index]
                    .quantity
                    .checked_add(quantity)
                    .ok_or(OrderError::AmountOverflow)?;
                lines[index] = OrderedProduct {
                    product: product.clone(),
                    quantity: merged,
                };
                index
            }
            None => {
                ensure_available(product)?;
                lines.push(OrderedProduct {
                    product: product.clone(),
                    quantity,
                });
                lines.len() - 1
            }
        };

        self.commit(lines)?;
        Ok(&self.lines[index])
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove_product(&mut self, product_id: ProductId) -> bool {
        match self.position(product_id) {
            Some(index) => {
                self.lines.remove(index);
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Set the quantity of `product` directly.
    ///
    /// `quantity <= 0` removes the line (returns `None`); otherwise the line is
    /// created if absent.
    pub fn set_quantity(
        &mut self,
        product: &Product,
        quantity: i64,
    ) -> Result<Option<&OrderedProduct>, OrderError> {
        if quantity <= 0 {
            self.remove_product(product.id_typed());
            return Ok(None);
        }
        let quantity = positive_quantity(quantity)?;
        self.ensure_currency(product)?;

        let mut lines = self.lines.clone();
        let line = OrderedProduct {
            product: product.clone(),
            quantity,
        };
        let index = match self.position(product.id_typed()) {
            Some(index) => {
                lines[index] = line;
                index
            }
            None => {
                ensure_available(product)?;
                lines.push(line);
                lines.len() - 1
            }
        };

        self.commit(lines)?;
        Ok(Some(&self.lines[index]))
    }

    /// Remove every line. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        if self.lines.is_empty() {
            return false;
        }
        self.lines.clear();
        self.version += 1;
        true
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id() == product_id)
    }

    fn ensure_currency(&self, product: &Product) -> Result<(), OrderError> {
        if product.currency() != self.currency {
            return Err(OrderError::CurrencyMismatch {
                expected: self.currency,
                found: product.currency(),
            });
        }
        Ok(())
    }

    /// Replace the lines after proving every amount is representable.
    fn commit(&mut self, lines: Vec<OrderedProduct>) -> Result<(), OrderError> {
        let mut total = Money::zero(self.currency);
        for line in &lines {
            let line_total = line.product.price().checked_mul(line.quantity)?;
            total = total.checked_add(line_total)?;
        }
        self.lines = lines;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn positive_quantity(quantity: i64) -> Result<u32, OrderError> {
    if quantity <= 0 {
        return Err(OrderError::InvalidQuantity(quantity));
    }
    u32::try_from(quantity).map_err(|_| OrderError::AmountOverflow)
}

fn ensure_available(product: &Product) -> Result<(), OrderError> {
    if !product.is_available() {
        return Err(OrderError::ProductUnavailable(product.id_typed()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn eur(minor_units: i64) -> Money {
        Money::new(minor_units, Currency::Eur)
    }

    fn widget() -> Product {
        Product::new(ProductId::new(), "Widget", eur(1000))
    }

    fn gadget() -> Product {
        Product::new(ProductId::new(), "Gadget", eur(250))
    }

    fn empty_order() -> Order {
        Order::new(OrderId::new(), Currency::Eur)
    }

    #[test]
    fn adding_same_product_twice_merges_the_line() {
        let mut order = empty_order();
        let widget = widget();

        order.add_product(&widget, 2).unwrap();
        assert_eq!(order.total_price(), eur(2000));
        assert_eq!(order.item_count(), 2);

        let line = order.add_product(&widget, 3).unwrap();
        assert_eq!(line.quantity(), 5);
        assert_eq!(order.ordered_products().len(), 1);
        assert_eq!(order.total_price(), eur(5000));
    }

    #[test]
    fn non_positive_add_is_rejected_without_change() {
        let mut order = empty_order();
        let widget = widget();
        order.add_product(&widget, 1).unwrap();
        let before = order.clone();

        assert_eq!(
            order.add_product(&widget, 0).unwrap_err(),
            OrderError::InvalidQuantity(0)
        );
        assert_eq!(
            order.add_product(&gadget(), -4).unwrap_err(),
            OrderError::InvalidQuantity(-4)
        );
        assert_eq!(order, before);
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let mut order = empty_order();
        let widget = widget();
        let gadget = gadget();
        order.add_product(&widget, 5).unwrap();
        order.add_product(&gadget, 2).unwrap();

        assert!(order.set_quantity(&widget, 0).unwrap().is_none());
        assert!(order.line(widget.id_typed()).is_none());
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total_price(), eur(500));
    }

    #[test]
    fn set_quantity_creates_absent_line() {
        let mut order = empty_order();
        let gadget = gadget();

        let line = order.set_quantity(&gadget, 4).unwrap().unwrap();
        assert_eq!(line.quantity(), 4);
        assert_eq!(order.total_price(), eur(1000));
    }

    #[test]
    fn remove_absent_product_is_a_no_op() {
        let mut order = empty_order();
        order.add_product(&widget(), 1).unwrap();
        let version = order.version();

        assert!(!order.remove_product(ProductId::new()));
        assert_eq!(order.version(), version);
        assert_eq!(order.ordered_products().len(), 1);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut order = empty_order();
        let widget = widget();
        let gadget = gadget();
        order.add_product(&gadget, 1).unwrap();
        order.add_product(&widget, 1).unwrap();
        order.add_product(&gadget, 1).unwrap();

        let names: Vec<_> = order
            .ordered_products()
            .iter()
            .map(|l| l.product().name())
            .collect();
        assert_eq!(names, ["Gadget", "Widget"]);
    }

    #[test]
    fn foreign_currency_product_is_rejected() {
        let mut order = empty_order();
        let dollar_widget = Product::new(ProductId::new(), "Widget", Money::new(100, Currency::Usd));

        let err = order.add_product(&dollar_widget, 1).unwrap_err();
        assert_eq!(
            err,
            OrderError::CurrencyMismatch {
                expected: Currency::Eur,
                found: Currency::Usd,
            }
        );
        assert!(order.is_empty());
    }

    #[test]
    fn unavailable_product_cannot_open_a_line() {
        let mut order = empty_order();
        let mut widget = widget();
        widget.set_available(false);

        assert_eq!(
            order.add_product(&widget, 1).unwrap_err(),
            OrderError::ProductUnavailable(widget.id_typed())
        );
        assert_eq!(
            order.set_quantity(&widget, 1).unwrap_err(),
            OrderError::ProductUnavailable(widget.id_typed())
        );
        assert!(order.is_empty());
    }

    #[test]
    fn overflowing_total_is_rejected_without_change() {
        let mut order = empty_order();
        let pricey = Product::new(ProductId::new(), "Yacht", eur(i64::MAX / 2));
        order.add_product(&pricey, 1).unwrap();
        let before = order.clone();

        assert_eq!(
            order.add_product(&pricey, 2).unwrap_err(),
            OrderError::AmountOverflow
        );
        assert_eq!(order, before);
    }

    #[test]
    fn readding_refreshes_product_copy() {
        let mut order = empty_order();
        let widget = widget();
        order.add_product(&widget, 1).unwrap();

        let repriced = widget.clone().with_price(eur(1200));
        order.add_product(&repriced, 1).unwrap();
        assert_eq!(order.total_price(), eur(2400));
    }

    #[test]
    fn clear_empties_and_bumps_version_once() {
        let mut order = empty_order();
        order.add_product(&widget(), 3).unwrap();
        let version = order.version();

        assert!(order.clear());
        assert!(order.is_empty());
        assert_eq!(order.version(), version + 1);
        assert!(!order.clear());
        assert_eq!(order.version(), version + 1);
    }

    #[test]
    fn order_round_trips_as_json_document() {
        let mut order = empty_order();
        order.add_product(&widget(), 2).unwrap();

        let json = serde_json::to_value(&order).unwrap();
        let restored: Order = serde_json::from_value(json).unwrap();
        assert_eq!(restored, order);
    }

    fn stored_document() -> serde_json::Value {
        let mut order = empty_order();
        order.add_product(&widget(), 2).unwrap();
        serde_json::to_value(&order).unwrap()
    }

    #[test]
    fn restoring_rejects_zero_quantity_line() {
        let mut doc = stored_document();
        doc["lines"][0]["quantity"] = serde_json::json!(0);

        let err = serde_json::from_value::<Order>(doc).unwrap_err();
        assert!(err.to_string().contains("invalid quantity"), "{err}");
    }

    #[test]
    fn restoring_rejects_duplicate_product_lines() {
        let mut doc = stored_document();
        let line = doc["lines"][0].clone();
        doc["lines"].as_array_mut().unwrap().push(line);

        let err = serde_json::from_value::<Order>(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate line"), "{err}");
    }

    #[test]
    fn restoring_rejects_foreign_currency_line() {
        let mut doc = stored_document();
        doc["lines"][0]["product"]["price"]["currency"] = serde_json::json!("USD");

        let err = serde_json::from_value::<Order>(doc).unwrap_err();
        assert!(err.to_string().contains("currency mismatch"), "{err}");
    }

    #[test]
    fn restoring_rejects_overflowing_total() {
        let mut doc = stored_document();
        doc["lines"][0]["product"]["price"]["minor_units"] = serde_json::json!(i64::MAX);

        let err = serde_json::from_value::<Order>(doc).unwrap_err();
        assert!(err.to_string().contains("amount overflow"), "{err}");
    }

    #[test]
    fn restoring_keeps_the_stored_version() {
        let mut order = empty_order();
        order.add_product(&widget(), 1).unwrap();
        order.add_product(&gadget(), 1).unwrap();
        order.clear();

        let restored: Order = serde_json::from_value(serde_json::to_value(&order).unwrap()).unwrap();
        assert_eq!(restored.version(), 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(usize, i64),
            Remove(usize),
            Set(usize, i64),
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0usize..4, -3i64..8).prop_map(|(p, q)| Op::Add(p, q)),
                2 => (0usize..4).prop_map(Op::Remove),
                3 => (0usize..4, -2i64..8).prop_map(|(p, q)| Op::Set(p, q)),
                1 => Just(Op::Clear),
            ]
        }

        fn catalog() -> Vec<Product> {
            [("A", 199), ("B", 1000), ("C", 5), ("D", 123_456)]
                .into_iter()
                .map(|(name, price)| Product::new(ProductId::new(), name, eur(price)))
                .collect()
        }

        fn assert_invariants(order: &Order) -> Result<(), TestCaseError> {
            let mut seen = HashSet::new();
            let mut expected_total = 0i64;
            let mut expected_count = 0u64;
            for line in order.ordered_products() {
                prop_assert!(seen.insert(line.product_id()), "duplicate line");
                prop_assert!(line.quantity() >= 1);
                expected_total += line.product().price().minor_units() * i64::from(line.quantity());
                expected_count += u64::from(line.quantity());
            }
            prop_assert_eq!(order.total_price(), eur(expected_total));
            prop_assert_eq!(order.item_count(), expected_count);
            Ok(())
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: invariants hold after every operation of any sequence,
            /// and rejected operations change nothing.
            #[test]
            fn invariants_hold_for_any_sequence(ops in prop::collection::vec(op(), 1..40)) {
                let products = catalog();
                let mut order = empty_order();

                for op in ops {
                    let before = order.clone();
                    match op {
                        Op::Add(p, q) => {
                            let result = order.add_product(&products[p], q).map(|_| ());
                            if q <= 0 {
                                prop_assert_eq!(result, Err(OrderError::InvalidQuantity(q)));
                                prop_assert_eq!(&order, &before);
                            } else {
                                prop_assert!(result.is_ok());
                            }
                        }
                        Op::Remove(p) => {
                            order.remove_product(products[p].id_typed());
                            prop_assert!(order.line(products[p].id_typed()).is_none());
                        }
                        Op::Set(p, q) => {
                            order.set_quantity(&products[p], q).unwrap();
                            let line = order.line(products[p].id_typed());
                            if q <= 0 {
                                prop_assert!(line.is_none());
                            } else {
                                prop_assert_eq!(line.map(OrderedProduct::quantity), Some(q as u32));
                            }
                        }
                        Op::Clear => {
                            order.clear();
                            prop_assert!(order.is_empty());
                        }
                    }
                    assert_invariants(&order)?;
                    prop_assert!(order.version() >= before.version());
                }
            }

            /// Property: set_quantity(p, 0) is indistinguishable from remove_product(p).
            #[test]
            fn set_zero_equals_remove(quantities in prop::collection::vec(1i64..10, 4), target in 0usize..4) {
                let products = catalog();
                let mut order = empty_order();
                for (product, q) in products.iter().zip(&quantities) {
                    order.add_product(product, *q).unwrap();
                }

                let mut via_set = order.clone();
                let mut via_remove = order.clone();
                via_set.set_quantity(&products[target], 0).unwrap();
                via_remove.remove_product(products[target].id_typed());

                prop_assert_eq!(&via_set, &via_remove);
                prop_assert_eq!(via_set.item_count(), order.item_count() - quantities[target] as u64);
            }
        }
    }
}
