//! Checkout command.

use shunny_core::ProductId;
use shunny_storefront::balance::BALANCE_CHANGED_EVENT;
use shunny_storefront::{ShopContext, ShopError};
use tracing::info;

/// Select `ids` (or every line when `all` is set) and check out.
///
/// A balance observer is registered for the duration of the checkout and
/// logs the change event it receives.
///
/// # Errors
///
/// Returns an error if a requested ID is not in the cart, nothing is
/// selected, or the balance does not cover the subtotal.
pub async fn run(ctx: &mut ShopContext, ids: &[ProductId], all: bool) -> Result<(), ShopError> {
    if all {
        if !ctx.all_selected() {
            ctx.toggle_all();
        }
    } else {
        for &id in ids {
            if !ctx.select(id, true) {
                return Err(ShopError::NotInCart(id));
            }
        }
    }

    let observer = ctx.subscribe();
    let observed = tokio::spawn(async move {
        let mut observer = observer;
        observer.next().await
    });

    let receipt = ctx.checkout();
    if receipt.is_err() {
        observed.abort();
    }
    let receipt = receipt?;

    if let Ok(Some(event)) = observed.await {
        info!(
            "{}: {} -> {}",
            BALANCE_CHANGED_EVENT,
            event.previous.display_rupiah(),
            event.balance.display_rupiah()
        );
    }

    info!("Receipt {}", receipt.id);
    for item in &receipt.purchased {
        info!(
            "  #{} {} x {} = {}",
            item.id,
            item.title,
            item.quantity,
            item.line_total().display_rupiah()
        );
    }
    info!(
        "Paid {} for {} items, remaining balance {}",
        receipt.subtotal.display_rupiah(),
        receipt.purchased_count,
        receipt.remaining_balance.display_rupiah()
    );
    Ok(())
}
