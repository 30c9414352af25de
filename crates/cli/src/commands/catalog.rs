//! Catalog commands.

use shunny_core::NewProduct;
use shunny_storefront::catalog::{CatalogProvider, HttpCatalog, ProductFilter};
use shunny_storefront::pagination::paginate;
use shunny_storefront::{ShopConfig, ShopError};
use tracing::info;

/// Fetch products matching `filter` and log one page of them.
///
/// # Errors
///
/// Returns an error if the catalog cannot be reached or answers badly.
pub async fn browse(config: &ShopConfig, filter: &ProductFilter, page: usize) -> Result<(), ShopError> {
    let catalog = HttpCatalog::new(config.catalog_url.clone());
    let products = catalog.fetch_products(filter).await?;
    let page = paginate(&products, page, config.page_size);

    if page.total_pages == 0 {
        info!("No products found");
        return Ok(());
    }

    for product in &page.items {
        let rating = product
            .rating
            .as_ref()
            .map_or_else(String::new, |r| format!(" ({:.1}, {} reviews)", r.rate, r.count));
        info!(
            "#{} {} [{}] {}{}",
            product.id,
            product.title,
            product.category,
            product.price.display_rupiah(),
            rating
        );
    }
    info!("Page {} of {}", page.current_page, page.total_pages);
    Ok(())
}

/// Add `product` to the catalog backend.
///
/// # Errors
///
/// Returns an error if the product is invalid or the backend rejects it.
pub async fn add(config: &ShopConfig, product: &NewProduct) -> Result<(), ShopError> {
    let catalog = HttpCatalog::new(config.catalog_url.clone());
    let created = catalog.create_product(product).await?;
    info!(
        "Added #{} {} [{}] {}",
        created.id,
        created.title,
        created.category,
        created.price.display_rupiah()
    );
    Ok(())
}
