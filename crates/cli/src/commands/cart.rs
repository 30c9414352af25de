//! Cart commands.

use shunny_core::ProductId;
use shunny_storefront::catalog::{CatalogProvider, HttpCatalog};
use shunny_storefront::{ShopConfig, ShopContext, ShopError};
use tracing::{info, warn};

/// Log every cart line and the cart totals.
pub fn list(ctx: &ShopContext) {
    let cart = ctx.cart();
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in cart.items() {
        info!(
            "#{} {} - {} x {} = {}",
            item.id,
            item.title,
            item.quantity,
            item.unit_price.display_rupiah(),
            item.line_total().display_rupiah()
        );
    }
    info!(
        "{} items, total {}",
        cart.total_quantity(),
        cart.total_price().display_rupiah()
    );
}

/// Look up `id` in the catalog and add it to the cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be reached or has no such product.
pub async fn add(
    ctx: &mut ShopContext,
    config: &ShopConfig,
    id: ProductId,
    quantity: i64,
) -> Result<(), ShopError> {
    let catalog = HttpCatalog::new(config.catalog_url.clone());
    let product = catalog.fetch_product(id).await?;
    info!("Adding {} to cart", product.title);

    ctx.add_item(&product, quantity);
    if let Some(item) = ctx.cart().get(id) {
        info!("#{} now has quantity {}", id, item.quantity);
    }
    Ok(())
}

/// Set the quantity of a cart line.
pub fn set(ctx: &mut ShopContext, id: ProductId, quantity: i64) {
    if ctx.set_quantity(id, quantity) {
        if let Some(item) = ctx.cart().get(id) {
            info!("#{} now has quantity {}", id, item.quantity);
        }
    } else {
        warn!("Product {id} is not in the cart");
    }
}

/// Remove a cart line.
pub fn remove(ctx: &mut ShopContext, id: ProductId) {
    if ctx.remove_item(id) {
        info!("Removed #{id} from cart");
    } else {
        warn!("Product {id} is not in the cart");
    }
}

/// Empty the cart.
pub fn clear(ctx: &mut ShopContext) {
    ctx.clear_cart();
    info!("Cart cleared");
}
