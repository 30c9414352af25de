//! Balance commands.

use shunny_core::Amount;
use shunny_storefront::{ShopContext, ShopError};
use tracing::info;

/// Log the current balance.
pub fn show(ctx: &ShopContext) {
    info!("Balance: {}", ctx.balance().display_rupiah());
}

/// Add funds to the balance.
///
/// # Errors
///
/// Returns an error if the new balance is not representable.
pub fn top_up(ctx: &mut ShopContext, amount: Amount) -> Result<(), ShopError> {
    let balance = ctx.top_up(amount)?;
    info!(
        "Added {}, balance is now {}",
        amount.display_rupiah(),
        balance.display_rupiah()
    );
    Ok(())
}
