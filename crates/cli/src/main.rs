//! `FakeStore` CLI - Browse the catalog, manage the cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # List products (custom products, then the remote catalog, then samples)
//! fakestore catalog products
//!
//! # Add product 3 to the cart and show it
//! fakestore cart add 3
//!
//! # Check out as a signed-in user
//! FAKESTORE_EMAIL=ada@example.com FAKESTORE_PASSWORD=... \
//!     fakestore checkout --name "Ada" --address "1 Main St" --city Springfield --zip 12345
//! ```
//!
//! # Commands
//!
//! - `catalog` - Products, categories, and an endpoint probe
//! - `cart` - Show and edit the local cart
//! - `checkout` - Place an order for the cart
//! - `orders` - Order history
//! - `account` - Register, view and edit the profile, delete the account
//! - `products` - Manage custom products
//!
//! Without `FIREBASE_PROJECT_ID`/`FIREBASE_API_KEY` the CLI runs on in-memory
//! accounts and documents that last for a single invocation; pass
//! `--create-account` to register the given credentials on the fly.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fakestore_storefront::config::StorefrontConfig;
use fakestore_storefront::state::AppState;

mod commands;

use commands::Credentials;

#[derive(Parser)]
#[command(name = "fakestore")]
#[command(author, version, about = "FakeStore storefront client")]
struct Cli {
    /// Account email for commands that act as a signed-in user
    #[arg(long, global = true, env = "FAKESTORE_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "FAKESTORE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Register the credentials instead of signing in
    #[arg(long, global = true)]
    create_account: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Place an order for the cart
    Checkout {
        /// Recipient name
        #[arg(short, long)]
        name: String,

        /// Street address
        #[arg(short, long)]
        address: String,

        /// City
        #[arg(short, long)]
        city: String,

        /// ZIP code
        #[arg(short, long)]
        zip: String,

        /// Contact email (defaults to the account email)
        #[arg(long)]
        contact_email: Option<String>,
    },
    /// List orders, newest first
    Orders,
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage custom products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories
    Categories,
    /// Call each catalog endpoint directly and report the result
    Probe,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one of a product
    Add { product_id: i32 },
    /// Remove a product
    Remove { product_id: i32 },
    /// Set a product's quantity (0 or less removes it)
    Set {
        product_id: i32,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create an account with the given credentials
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Show the profile
    Profile,
    /// Change the display name
    Rename { name: String },
    /// Delete the profile and the account
    Delete,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List custom products
    List,
    /// Add a custom product
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        price: Decimal,

        #[arg(short, long)]
        category: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Image URL
        #[arg(short, long, default_value = "")]
        image: String,
    },
    /// Update fields of a custom product
    Update {
        /// Document id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a custom product
    Delete {
        /// Document id
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Configuration is needed before Sentry and tracing can start
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fakestore_cli=info,fakestore_storefront=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        if let Some(command_error) = e.downcast_ref::<commands::CommandError>() {
            command_error.report();
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;
    let credentials = Credentials::new(cli.email, cli.password, cli.create_account);

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Products { category } => {
                commands::catalog::products(&state, category.as_deref()).await;
            }
            CatalogAction::Categories => commands::catalog::categories(&state).await,
            CatalogAction::Probe => commands::catalog::probe(&state).await,
        },
        Commands::Cart { action } => {
            let action = match action.unwrap_or(CartAction::Show) {
                CartAction::Show => commands::cart::Edit::Show,
                CartAction::Add { product_id } => commands::cart::Edit::Add(product_id),
                CartAction::Remove { product_id } => commands::cart::Edit::Remove(product_id),
                CartAction::Set {
                    product_id,
                    quantity,
                } => commands::cart::Edit::SetQuantity(product_id, quantity),
                CartAction::Clear => commands::cart::Edit::Clear,
            };
            commands::cart::run(&state, &credentials, action).await?;
        }
        Commands::Checkout {
            name,
            address,
            city,
            zip,
            contact_email,
        } => {
            let form = commands::checkout::AddressForm {
                name,
                address,
                city,
                zip,
                contact_email,
            };
            commands::checkout::run(&state, &credentials, form).await?;
        }
        Commands::Orders => commands::orders::history(&state, &credentials).await?,
        Commands::Account { action } => match action {
            AccountAction::Register { name } => {
                commands::account::register(&state, &credentials, &name).await?;
            }
            AccountAction::Profile => commands::account::profile(&state, &credentials).await?,
            AccountAction::Rename { name } => {
                commands::account::rename(&state, &credentials, &name).await?;
            }
            AccountAction::Delete => commands::account::delete(&state, &credentials).await?,
        },
        Commands::Products { action } => match action {
            ProductAction::List => commands::products::list(&state, &credentials).await?,
            ProductAction::Add {
                title,
                price,
                category,
                description,
                image,
            } => {
                let draft = fakestore_core::ProductDraft {
                    title,
                    price,
                    category,
                    description,
                    image,
                };
                commands::products::add(&state, &credentials, &draft).await?;
            }
            ProductAction::Update {
                id,
                title,
                price,
                category,
                description,
                image,
            } => {
                let patch = fakestore_storefront::services::ProductPatch {
                    title,
                    price,
                    category,
                    description,
                    image,
                };
                commands::products::update(&state, &credentials, &id, &patch).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&state, &credentials, &id).await?,
        },
    }
    Ok(())
}
