//! Seller console commands.
//!
//! Every command signs in first and is refused unless the account holds the
//! seller role, the same gate the seller pages use.

use std::path::Path;

use clap::Args;
use tokio::sync::mpsc;

use artisan_backend::UploadProgress;
use artisan_core::ProductId;
use artisan_core::models::Product;
use artisan_storefront::catalog::{CategoryFilter, SortOrder};
use artisan_storefront::routes::SELLER_LANDING;
use artisan_storefront::seller::{
    ImageFile, Inventory, ItemForm, add_item as submit_item, load_dashboard, load_for_edit,
    update_item,
};
use artisan_storefront::App;

use super::{CliError, emit, sign_in, start_app};
use crate::LoginArgs;

/// Item form flags.
#[derive(Args, Debug, Clone, Default)]
pub struct ItemArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Category slug, e.g. `pottery`
    #[arg(long)]
    pub category: Option<String>,
    /// Price in rupees, e.g. `450` or `199.50`
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub quantity: Option<String>,
    /// Image file to upload
    #[arg(long)]
    pub image: Option<String>,
}

impl ItemArgs {
    /// Overlay the given flags on `form`.
    fn apply_to(&self, mut form: ItemForm) -> ItemForm {
        let fields = [
            (&self.name, &mut form.name),
            (&self.description, &mut form.description),
            (&self.category, &mut form.category),
            (&self.price, &mut form.price),
            (&self.quantity, &mut form.quantity),
        ];
        for (flag, field) in fields {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
        form
    }
}

/// Sign in and check the seller gate.
pub async fn sign_in_seller(login: &LoginArgs) -> Result<App, CliError> {
    let app = start_app().await?;
    if !sign_in(&app, login).await? {
        app.shutdown();
        return Err(CliError::InvalidArgument(
            "--email and --password (or ARTISAN_EMAIL and ARTISAN_PASSWORD) are required"
                .to_string(),
        ));
    }

    let view = app.open(SELLER_LANDING);
    if !view.renders() {
        app.shutdown();
        return Err(CliError::Denied(
            "this account is not a seller account".to_string(),
        ));
    }
    Ok(app)
}

async fn read_image(path: &str) -> Result<ImageFile, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    let file_name = Path::new(path)
        .file_name()
        .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(ImageFile::new(file_name, bytes))
}

/// Log upload progress until the sender is dropped.
fn progress_logger() -> (mpsc::UnboundedSender<UploadProgress>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
    let task = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            tracing::info!(percent = progress.percent(), "Uploading image");
        }
    });
    (tx, task)
}

fn item_line(product: &Product) -> String {
    format!(
        "{:<24} {:>12}  qty {:<4} sold {:<4} {}",
        product.name,
        product.price.display(),
        product.quantity,
        product.sold,
        product.id
    )
}

pub async fn dashboard(app: &App) -> Result<(), CliError> {
    let dashboard = load_dashboard(app.api(), &app.session().current_session()).await?;

    emit(&dashboard.greeting);
    emit(format!(
        "Total products: {}",
        dashboard
            .total_products
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    ));
    emit(format!(
        "Pending orders: {}",
        dashboard
            .pending_orders
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    ));
    emit(format!("Monthly revenue: {}", dashboard.monthly_revenue.display()));

    if !dashboard.preview.is_empty() {
        emit("");
        emit("Your products:");
        for product in &dashboard.preview {
            emit(item_line(product));
        }
    }
    if !dashboard.recent_sales.is_empty() {
        emit("");
        emit("Recent sales:");
        for sale in &dashboard.recent_sales {
            emit(format!(
                "{:<20} {:<18} {:>12}  {}",
                sale.product, sale.date, sale.amount, sale.status
            ));
        }
    }
    for problem in &dashboard.problems {
        emit(format!("! {problem}"));
    }
    Ok(())
}

pub async fn items(app: &App, search: &str, category: &str, sort: &str) -> Result<(), CliError> {
    let filter: CategoryFilter = category.parse().map_err(CliError::InvalidArgument)?;
    let sort: SortOrder = sort.parse().map_err(CliError::InvalidArgument)?;

    let mut inventory = Inventory::load(app.api()).await?;
    inventory.search = search.to_string();
    inventory.filter = filter;
    inventory.sort = sort;

    let visible = inventory.visible();
    if visible.is_empty() {
        emit("No items found");
    }
    for product in &visible {
        emit(item_line(product));
    }
    Ok(())
}

pub async fn delete(app: &App, id: &str) -> Result<(), CliError> {
    let id = ProductId::new(id);
    let mut inventory = Inventory::load(app.api()).await?;
    inventory.delete(app.api(), &id).await?;
    emit(format!("Deleted {id}"));
    Ok(())
}

pub async fn add_item(app: &App, args: &ItemArgs) -> Result<(), CliError> {
    let form = args.apply_to(ItemForm::default());
    let image = match &args.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let (progress, logger) = progress_logger();
    let result = submit_item(
        app.backend(),
        &app.session().current_session(),
        &form,
        image,
        Some(progress),
    )
    .await;
    let _ = logger.await;

    let product = result?;
    emit(format!("Added {} ({})", product.name, product.id));
    Ok(())
}

pub async fn edit_item(app: &App, id: &str, args: &ItemArgs) -> Result<(), CliError> {
    let id = ProductId::new(id);
    let session = app.session().current_session();
    let existing = load_for_edit(app.backend().store.as_ref(), &session, &id).await?;
    let form = args.apply_to(ItemForm::from(&existing));
    let image = match &args.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let (progress, logger) = progress_logger();
    let result = update_item(app.backend(), &session, &id, &form, image, Some(progress)).await;
    let _ = logger.await;

    let product = result?;
    emit(format!("Updated {} ({})", product.name, product.id));
    Ok(())
}
