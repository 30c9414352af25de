//! Shunny Shop CLI - drive the cart and checkout engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shunny catalog --search shirt --sort price-asc --page 2
//!
//! # Add a product to the catalog backend
//! shunny catalog add --title Headphones --price 199.5 --image https://img.example/h.jpg
//!
//! # Add two of product 3 to the cart, then list it
//! shunny cart add 3 --quantity 2
//! shunny cart list
//!
//! # Buy products 3 and 5, or everything in the cart
//! shunny checkout --select 3 --select 5
//! shunny checkout --all
//!
//! # Check or top up the balance
//! shunny balance show
//! shunny balance top-up 250000
//! ```
//!
//! # Commands
//!
//! - `cart` - List and edit the cart
//! - `balance` - Show or top up the balance
//! - `checkout` - Pay for selected cart lines
//! - `favorites` - Manage favorite products
//! - `catalog` - Browse products, or `catalog add` a new one
//!
//! Configuration comes from `SHOP_*` environment variables (see
//! `ShopConfig`). Set `RUST_LOG` to change log verbosity.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use shunny_core::{Amount, NewProduct, ProductId};
use shunny_storefront::catalog::{ProductFilter, SortOption};
use shunny_storefront::{FileStore, ShopConfig, ShopContext, ShopError};

mod commands;

#[derive(Parser)]
#[command(name = "shunny")]
#[command(author, version, about = "Shunny Shop cart and checkout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show or top up the balance
    Balance {
        #[command(subcommand)]
        action: BalanceAction,
    },
    /// Pay for selected cart lines
    Checkout(CheckoutArgs),
    /// Manage favorite products
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Browse or add products
    #[command(args_conflicts_with_subcommands = true)]
    Catalog {
        #[command(subcommand)]
        action: Option<CatalogAction>,

        #[command(flatten)]
        browse: CatalogArgs,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    List,
    /// Add a product from the catalog
    Add {
        /// Product ID
        id: ProductId,

        /// Quantity to add (negative values reduce, never below 1)
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a cart line (at least 1)
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum BalanceAction {
    /// Show the current balance
    Show,
    /// Add funds
    TopUp {
        /// Amount to add
        amount: Amount,
    },
}

#[derive(Args)]
struct CheckoutArgs {
    /// Product IDs to buy
    #[arg(short, long = "select", required_unless_present = "all")]
    select: Vec<ProductId>,

    /// Buy every cart line
    #[arg(long, conflicts_with = "select")]
    all: bool,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorite product IDs
    List,
    /// Flip a product in or out of favorites
    Toggle {
        /// Product ID
        id: ProductId,
    },
    /// Mark a product as favorite
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Unmark a favorite product
    Remove {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Add a product to the catalog backend
    Add(NewProductArgs),
}

#[derive(Args)]
struct NewProductArgs {
    /// Product title
    #[arg(short, long)]
    title: String,

    /// Unit price
    #[arg(short, long)]
    price: Amount,

    /// Product description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Category name
    #[arg(short, long, default_value = NewProduct::DEFAULT_CATEGORY)]
    category: String,

    /// Image URL
    #[arg(short, long)]
    image: String,

    /// Average rating between 0 and 5
    #[arg(short, long, default_value_t = NewProduct::DEFAULT_RATING)]
    rating: f64,
}

#[derive(Args)]
struct CatalogArgs {
    /// Case-insensitive title search
    #[arg(short, long)]
    search: Option<String>,

    /// Category name (`all` for every category)
    #[arg(short, long)]
    category: Option<String>,

    /// Sort order (`price-asc`, `price-desc`, `rating-desc`)
    #[arg(long, default_value = "none")]
    sort: SortOption,

    /// Keep at most this many products
    #[arg(short, long)]
    limit: Option<usize>,

    /// Page to show (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shunny_storefront=info,shunny_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::debug!(error = %e, "Command failed");
        tracing::error!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ShopError> {
    let config = ShopConfig::from_env()?;
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let mut ctx = ShopContext::open(store, &config);

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&ctx),
            CartAction::Add { id, quantity } => {
                commands::cart::add(&mut ctx, &config, id, quantity).await?;
            }
            CartAction::Set { id, quantity } => commands::cart::set(&mut ctx, id, quantity),
            CartAction::Remove { id } => commands::cart::remove(&mut ctx, id),
            CartAction::Clear => commands::cart::clear(&mut ctx),
        },
        Commands::Balance { action } => match action {
            BalanceAction::Show => commands::balance::show(&ctx),
            BalanceAction::TopUp { amount } => commands::balance::top_up(&mut ctx, amount)?,
        },
        Commands::Checkout(args) => {
            commands::checkout::run(&mut ctx, &args.select, args.all).await?;
        }
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&ctx, &config).await,
            FavoritesAction::Toggle { id } => commands::favorites::toggle(&mut ctx, id),
            FavoritesAction::Add { id } => commands::favorites::add(&mut ctx, id),
            FavoritesAction::Remove { id } => commands::favorites::remove(&mut ctx, id),
        },
        Commands::Catalog {
            action: Some(CatalogAction::Add(args)),
            ..
        } => {
            let product = NewProduct {
                title: args.title,
                price: args.price,
                description: args.description,
                category: args.category,
                image: args.image,
                rating: args.rating,
            };
            commands::catalog::add(&config, &product).await?;
        }
        Commands::Catalog {
            action: None,
            browse,
        } => {
            let filter = ProductFilter {
                search: browse.search,
                category: browse.category,
                sort: browse.sort,
                limit: browse.limit,
            };
            commands::catalog::browse(&config, &filter, browse.page).await?;
        }
    }

    ctx.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_checkout_requires_selection_or_all() {
        assert!(Cli::try_parse_from(["shunny", "checkout"]).is_err());
        assert!(Cli::try_parse_from(["shunny", "checkout", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["shunny", "checkout", "--select", "1", "--select", "2"]).is_ok());
        assert!(Cli::try_parse_from(["shunny", "checkout", "--all", "--select", "1"]).is_err());
    }

    #[test]
    fn test_cart_add_accepts_negative_quantity() {
        let cli = Cli::try_parse_from(["shunny", "cart", "add", "4", "--quantity", "-2"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Add { quantity: -2, .. }
            })
        ));
    }

    #[test]
    fn test_catalog_add_parses_product_fields() {
        let cli = Cli::try_parse_from([
            "shunny", "catalog", "add", "--title", "Headphones", "--price", "199.5", "--image",
            "https://img.example/h.jpg",
        ])
        .unwrap();
        let Commands::Catalog {
            action: Some(CatalogAction::Add(args)),
            ..
        } = cli.command
        else {
            panic!("expected catalog add");
        };
        assert_eq!(args.title, "Headphones");
        assert_eq!(args.price, "199.5".parse().unwrap());
        assert_eq!(args.category, "electronics");
        assert!((args.rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_catalog_add_requires_title_and_price() {
        assert!(Cli::try_parse_from(["shunny", "catalog", "add", "--image", "x"]).is_err());
    }

    #[test]
    fn test_catalog_browse_without_subcommand() {
        let cli = Cli::try_parse_from(["shunny", "catalog", "--page", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Catalog { action: None, browse: CatalogArgs { page: 2, .. } }
        ));
    }

    #[test]
    fn test_catalog_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["shunny", "catalog", "--sort", "newest"]).is_err());
        assert!(Cli::try_parse_from(["shunny", "catalog", "--sort", "rating-desc"]).is_ok());
    }
}
