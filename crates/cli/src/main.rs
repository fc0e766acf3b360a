//! Artisan Market CLI - storefront front-end and database migrations.
//!
//! # Usage
//!
//! ```bash
//! # Run seller API database migrations
//! artisan migrate
//!
//! # Browse the catalog
//! artisan catalog list --category pottery --sort priceAsc
//! artisan catalog show <product-id>
//!
//! # Accounts
//! artisan register -n "Meera" -e meera@example.com -p secret1 --seller
//! artisan open /seller/dashboard -e meera@example.com -p secret1
//!
//! # Seller console (credentials from ARTISAN_EMAIL / ARTISAN_PASSWORD)
//! artisan seller dashboard
//! artisan seller add-item --name "Blue vase" --category pottery --price 450 --quantity 3
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "artisan")]
#[command(author, version, about = "Artisan Market command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Sign-in flags shared by commands that act as a user.
#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long, env = "ARTISAN_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(short, long, env = "ARTISAN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run seller API database migrations
    Migrate,
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Put products in a cart and show the totals
    Cart {
        /// Product ids; repeat an id to add more than one
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Register as a seller
        #[arg(long)]
        seller: bool,
    },
    /// Resend the email verification message
    Verify {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Show what a path renders for a (possibly signed-in) user
    Open {
        path: String,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Seller console
    Seller {
        #[command(subcommand)]
        action: SellerAction,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Submit a profile form
    Profile {
        #[command(subcommand)]
        form: ProfileForm,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List product cards
    List {
        /// `all` or a category slug
        #[arg(short, long, default_value = "all")]
        category: String,
        /// Search name and description
        #[arg(short, long, default_value = "")]
        search: String,
        /// `newest`, `priceAsc`, `priceDesc` or `name`
        #[arg(long, default_value = "newest")]
        sort: String,
    },
    /// Show one product with similar products
    Show { id: String },
}

#[derive(Subcommand)]
enum SellerAction {
    /// Dashboard metrics
    Dashboard,
    /// List your items
    Items {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(short, long, default_value = "all")]
        category: String,
        #[arg(long, default_value = "newest")]
        sort: String,
    },
    /// Delete one of your items
    Delete { id: String },
    /// Add an item
    AddItem {
        #[command(flatten)]
        item: commands::seller::ItemArgs,
    },
    /// Replace one of your items
    EditItem {
        id: String,
        #[command(flatten)]
        item: commands::seller::ItemArgs,
    },
}

#[derive(Subcommand)]
enum ProfileForm {
    /// Buyer shipping details
    Buyer(commands::profile::BuyerArgs),
    /// Seller shop details
    Seller(commands::profile::SellerArgs),
}

/// Initialize Sentry when `SENTRY_DSN` is set. The guard flushes on drop.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "artisan=info,artisan_storefront=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::seller_api().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                search,
                sort,
            } => commands::catalog::list(&category, &search, &sort).await?,
            CatalogAction::Show { id } => commands::catalog::show(&id).await?,
        },
        Commands::Cart { ids } => commands::catalog::cart(&ids).await?,
        Commands::Register {
            name,
            email,
            password,
            seller,
        } => commands::account::register(&name, &email, &password, seller).await?,
        Commands::Verify { login } => commands::account::verify(&login).await?,
        Commands::Open { path, login } => commands::account::open(&path, &login).await?,
        Commands::Seller { action, login } => {
            let app = commands::seller::sign_in_seller(&login).await?;
            let result = match action {
                SellerAction::Dashboard => commands::seller::dashboard(&app).await,
                SellerAction::Items {
                    search,
                    category,
                    sort,
                } => commands::seller::items(&app, &search, &category, &sort).await,
                SellerAction::Delete { id } => commands::seller::delete(&app, &id).await,
                SellerAction::AddItem { item } => commands::seller::add_item(&app, &item).await,
                SellerAction::EditItem { id, item } => {
                    commands::seller::edit_item(&app, &id, &item).await
                }
            };
            app.shutdown();
            result?;
        }
        Commands::Profile { form } => match form {
            ProfileForm::Buyer(args) => commands::profile::buyer(args).await?,
            ProfileForm::Seller(args) => commands::profile::seller(args).await?,
        },
    }
    Ok(())
}
