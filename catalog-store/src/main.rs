use anyhow::Context;
use catalog_store::logger::init_logger_with_file;
use catalog_store::{
    Cart, CartStorage, CatalogConfig, CatalogStore, CategoryListing, backfill_sponsored,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Browse the storefront catalog datasets
#[derive(Debug, Parser)]
#[command(name = "catalog", version)]
struct Cli {
    /// Directory containing data/*.csv (overrides CATALOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Fetch datasets from this base URL (overrides CATALOG_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List categories, root categories only with --roots
    Categories {
        #[arg(long, conflicts_with = "landing")]
        roots: bool,
        /// Root categories, or all of them when there are no roots
        #[arg(long)]
        landing: bool,
    },
    /// Show one category
    Category { id: String },
    /// List products, optionally of one category
    Products {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one product
    Product { id: String },
    /// Search product names, descriptions, brands and category names
    Search { query: String },
    /// Sample sponsored products, resolving ad-server ids first
    Sponsored {
        #[arg(long, default_value_t = 4)]
        count: usize,
        #[arg(long)]
        category: Option<String>,
        /// Product ids returned by the ad server
        #[arg(long = "ad", value_name = "ID")]
        ads: Vec<String>,
    },
    /// Manage the cart state file
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Debug, Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Show cart lines and totals
    Show,
}

#[derive(Serialize)]
struct CartView<'a> {
    cart: &'a Cart,
    item_count: u32,
    totals: catalog_store::CartTotals,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = CatalogConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.into();
    }
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }

    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::debug!(?config, "Configuration loaded");

    let store = config.build_store().context("failed to build catalog store")?;

    match cli.command {
        Command::Categories { roots, landing } => {
            let listing = if roots {
                CategoryListing::Roots
            } else if landing {
                CategoryListing::Landing
            } else {
                CategoryListing::All
            };
            print_json(&store.list_categories(listing).await)
        }
        Command::Category { id } => match store.get_category_by_id(&id).await {
            Some(category) => print_json(&category),
            None => anyhow::bail!("category {} not found", id),
        },
        Command::Products { category } => {
            let products = match category {
                Some(id) => store.get_products_by_category(&id).await?,
                None => store.get_products().await?,
            };
            print_json(&products)
        }
        Command::Product { id } => match store.get_product_by_id(&id).await? {
            Some(product) => print_json(&product),
            None => anyhow::bail!("product {} not found", id),
        },
        Command::Search { query } => print_json(&store.search_products(&query).await?),
        Command::Sponsored {
            count,
            category,
            ads,
        } => {
            let products = backfill_sponsored(&store, &ads, count, category.as_deref()).await?;
            print_json(&products)
        }
        Command::Cart { action } => run_cart(&store, &config, action).await,
    }
}

async fn run_cart(store: &CatalogStore, config: &CatalogConfig, action: CartAction) -> anyhow::Result<()> {
    let storage = CartStorage::new(&config.cart_state_file);
    let mut cart = storage.load();
    let changed = !matches!(action, CartAction::Show);

    match action {
        CartAction::Add { id, quantity } => {
            let product = store
                .get_product_by_id(&id)
                .await?
                .with_context(|| format!("product {} not found", id))?;
            cart.add(&product, quantity);
            tracing::info!(product_id = %product.id, quantity, "Added to cart");
        }
        CartAction::Remove { id } => {
            if !cart.remove(&id) {
                tracing::warn!(product_id = %id, "Product not in cart");
            }
        }
        CartAction::Clear => cart.clear(),
        CartAction::Show => {}
    }

    if changed {
        storage.save(&cart)?;
    }
    let view = CartView {
        item_count: cart.item_count(),
        totals: cart.totals(&config.cart_pricing),
        cart: &cart,
    };
    print_json(&view)
}
