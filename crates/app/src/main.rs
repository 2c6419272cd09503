mod config;

use std::sync::Arc;

use anyhow::Context;

use storefront_cart::{CartController, LocaleFormatter, MoneyFormatter, StorefrontSession, checkout};
use storefront_core::{Currency, Money, ProductId, UserId};
use storefront_events::{
    CartUpdateListener, CartUpdatedEvent, Listener, ListenerError, UserSessionEvent,
    UserSessionListener,
};
use storefront_infra::{Facade, InMemoryFacade, ProductCriteria};
use storefront_products::Product;
use storefront_users::{ContactUpdate, User};

use crate::config::AppConfig;

/// Logs the cart total after every change, like the storefront's summary view.
struct CartSummaryLog {
    formatter: LocaleFormatter,
}

impl CartUpdateListener for CartSummaryLog {
    fn on_cart_updated(&self, event: &CartUpdatedEvent) -> Result<(), ListenerError> {
        let order = event.order();
        tracing::info!(
            items = order.item_count(),
            total = %self.formatter.format(order.total_price()),
            "cart summary"
        );
        Ok(())
    }
}

struct SessionLog;

impl UserSessionListener for SessionLog {
    fn on_login(&self, event: &UserSessionEvent) -> Result<(), ListenerError> {
        tracing::info!(user = %event.user().name, "welcome");
        Ok(())
    }

    fn on_logout(&self, event: &UserSessionEvent) -> Result<(), ListenerError> {
        tracing::info!(user = %event.user().name, "goodbye");
        Ok(())
    }
}

fn seed_catalogue(facade: &InMemoryFacade, currency: Currency) -> anyhow::Result<()> {
    let items = [("Widget", 1000), ("Gadget", 2499), ("Gizmo", 1250)];
    for (name, minor_units) in items {
        facade.insert_product(Product::new(ProductId::new(), name, Money::new(minor_units, currency)))?;
    }
    let mut retired = Product::new(ProductId::new(), "Doohickey", Money::new(99, currency));
    retired.set_available(false);
    facade.insert_product(retired)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("reading configuration")?;
    storefront_observability::init_with(&storefront_observability::TracingConfig {
        format: config.log_format,
        ..Default::default()
    });
    tracing::info!(currency = %config.currency, locale = %config.locale, "storefront starting");

    let facade = Arc::new(InMemoryFacade::new());
    seed_catalogue(&facade, config.currency).context("seeding catalogue")?;
    let formatter = LocaleFormatter::new(config.locale);
    let controller = CartController::with_formatter(Arc::clone(&facade), formatter);

    let session = StorefrontSession::new(config.currency);
    let summary = Arc::new(CartSummaryLog { formatter });
    let greeter = Arc::new(SessionLog);
    session.attach(&Listener::cart(Arc::clone(&summary)));
    session.attach(&Listener::session(Arc::clone(&greeter)));

    let catalogue = controller.browse(&ProductCriteria::available())?;
    for product in &catalogue {
        tracing::info!(product = product.name(), price = %controller.formatted_price(product), "listed");
    }

    let cart = session.cart();
    for (index, product) in catalogue.iter().enumerate() {
        let quantity = i64::try_from(index)? + 1;
        controller.add_product_by_id(cart, product.id_typed(), quantity)?;
    }
    if let Some(first) = catalogue.first() {
        controller.update_quantity_by_id(cart, first.id_typed(), 0)?;
    }

    let user = User::new(UserId::new(), "Aino Virtanen");
    facade.store_user(&user)?;
    session.login(user);
    session.update_profile(
        ContactUpdate {
            street_name: Some("Aurakatu 1".into()),
            zip: Some("20100".into()),
            city: Some("Turku".into()),
            email: Some("aino@example.com".into()),
            ..ContactUpdate::default()
        },
        facade.as_ref(),
    )?;

    let summary_view = controller.summary(&cart.order());
    println!("{}", serde_json::to_string_pretty(&summary_view)?);

    let receipt = checkout(&session, facade.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);

    session.logout();
    session.end();
    Ok(())
}
