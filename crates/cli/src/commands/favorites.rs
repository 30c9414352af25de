//! Favorites commands.

use shunny_core::ProductId;
use shunny_storefront::catalog::{HttpCatalog, resolve_products};
use shunny_storefront::{ShopConfig, ShopContext};
use tracing::info;

/// Log favorite products, looked up in the catalog.
///
/// A favorite the catalog cannot resolve is still listed under a placeholder title.
pub async fn list(ctx: &ShopContext, config: &ShopConfig) {
    let ids = ctx.favorites().ids();
    if ids.is_empty() {
        info!("No favorites yet");
        return;
    }

    let catalog = HttpCatalog::new(config.catalog_url.clone());
    for product in resolve_products(&catalog, ids).await {
        info!(
            "#{} {} - {}",
            product.id,
            product.title,
            product.price.display_rupiah()
        );
    }
}

/// Flip a product in or out of favorites.
pub fn toggle(ctx: &mut ShopContext, id: ProductId) {
    if ctx.favorites_mut().toggle(id) {
        info!("Added #{id} to favorites");
    } else {
        info!("Removed #{id} from favorites");
    }
}

/// Mark a product as favorite.
pub fn add(ctx: &mut ShopContext, id: ProductId) {
    ctx.favorites_mut().add(id);
    info!("Added #{id} to favorites");
}

/// Unmark a favorite product.
pub fn remove(ctx: &mut ShopContext, id: ProductId) {
    ctx.favorites_mut().remove(id);
    info!("Removed #{id} from favorites");
}
