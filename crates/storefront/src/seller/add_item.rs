//! Add and edit item forms.
//!
//! The image is always uploaded before the product record is written, so a
//! failed upload never leaves a record pointing at a missing image.

use chrono::Utc;
use tracing::instrument;

use artisan_backend::document::to_fields;
use artisan_backend::{Backend, DocumentStore, ProgressSender};
use artisan_core::models::{NewProduct, PRODUCTS_COLLECTION, Product, ValidationError};
use artisan_core::{Category, Price, ProductId, UserId};

use super::require_identity;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::session::Session;

/// Raw add-item form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub quantity: String,
}

/// Form input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidItem {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Price,
    pub quantity: u32,
}

impl ItemForm {
    /// Check required fields and parse the numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] for blank required fields,
    /// or [`ValidationError::Invalid`] for an unknown category, a price that
    /// is not a positive number, or a quantity that is not a whole number.
    pub fn validate(&self) -> std::result::Result<ValidItem, ValidationError> {
        let blank: Vec<&'static str> = [
            ("name", &self.name),
            ("category", &self.category),
            ("price", &self.price),
            ("quantity", &self.quantity),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !blank.is_empty() {
            return Err(ValidationError::MissingFields(blank));
        }

        let category = self
            .category
            .trim()
            .parse::<Category>()
            .map_err(|reason| ValidationError::Invalid {
                field: "category",
                reason,
            })?;
        let price = Price::parse(&self.price).map_err(|e| ValidationError::Invalid {
            field: "price",
            reason: e.to_string(),
        })?;
        let quantity =
            self.quantity
                .trim()
                .parse::<u32>()
                .map_err(|_| ValidationError::Invalid {
                    field: "quantity",
                    reason: "quantity must be a whole number".to_string(),
                })?;

        Ok(ValidItem {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category,
            price,
            quantity,
        })
    }
}

impl From<&Product> for ItemForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.slug().to_string(),
            price: product.price.amount().to_string(),
            quantity: product.quantity.to_string(),
        }
    }
}

/// An image picked in the form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wrap file contents, guessing the content type from the extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        };
        Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Storage path for a product image: `products/{uid}_{millis}_{file name}`.
#[must_use]
pub fn image_path(uid: &UserId, millis: i64, file_name: &str) -> String {
    format!("products/{uid}_{millis}_{file_name}")
}

async fn upload_image(
    backend: &Backend,
    uid: &UserId,
    image: ImageFile,
    progress: Option<ProgressSender>,
) -> Result<String> {
    let path = image_path(uid, Utc::now().timestamp_millis(), &image.file_name);
    let url = backend
        .storage
        .upload(&path, image.bytes, &image.content_type, progress)
        .await
        .inspect_err(|e| tracing::error!(path = %path, error = %e, "Image upload failed"))?;
    tracing::debug!(path = %path, "Image uploaded");
    Ok(url)
}

/// Create a product owned by the signed-in seller.
///
/// # Errors
///
/// Returns `NotSignedIn` without an identity, `Validation` for bad input,
/// `Upload` if the image cannot be stored (nothing is written then), or
/// `Store` if the record write fails.
#[instrument(skip(backend, session, form, image, progress), fields(name = %form.name))]
pub async fn add_item(
    backend: &Backend,
    session: &Session,
    form: &ItemForm,
    image: Option<ImageFile>,
    progress: Option<ProgressSender>,
) -> Result<Product> {
    let identity = require_identity(session)?;
    let item = form.validate()?;

    let image_url = match image {
        Some(image) => Some(upload_image(backend, &identity.uid, image, progress).await?),
        None => None,
    };

    let record = NewProduct {
        name: item.name,
        description: item.description,
        category: item.category,
        price: item.price,
        quantity: item.quantity,
        image_url,
        seller_id: Some(identity.uid.clone()),
        seller_email: identity.email.as_ref().map(ToString::to_string),
        created_at: Some(Utc::now()),
        sold: 0,
    };
    let id = backend
        .store
        .add(PRODUCTS_COLLECTION, to_fields(&record)?)
        .await?;

    add_breadcrumb("seller", "Item added", Some(&[("product_id", id.as_str())][..]));
    tracing::info!(product_id = %id, seller = %identity.uid, "Item added");
    Ok(record.into_product(ProductId::new(id)))
}

/// Read a product the signed-in seller may edit.
///
/// # Errors
///
/// Returns `NotSignedIn`, `NotFound` for an unknown id, `Forbidden` for a
/// product owned by someone else, or `Store` on read failure.
pub async fn load_for_edit(
    store: &dyn DocumentStore,
    session: &Session,
    id: &ProductId,
) -> Result<Product> {
    let identity = require_identity(session)?;
    let product: Product = store
        .read_one(PRODUCTS_COLLECTION, id.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?
        .decode()?;

    if !product.is_owned_by(&identity.uid) {
        tracing::warn!(product_id = %id, uid = %identity.uid, "Edit of product owned by another seller");
        return Err(AppError::Forbidden(format!("product {id}")));
    }
    Ok(product)
}

/// Replace an owned product with the edited form values.
///
/// Creation time, units sold and owner are kept. The image is replaced only
/// when a new one is given.
///
/// # Errors
///
/// Same as [`load_for_edit`], plus `Validation`, `Upload` and `Store`.
#[instrument(skip(backend, session, form, image, progress), fields(product_id = %id))]
pub async fn update_item(
    backend: &Backend,
    session: &Session,
    id: &ProductId,
    form: &ItemForm,
    image: Option<ImageFile>,
    progress: Option<ProgressSender>,
) -> Result<Product> {
    let existing = load_for_edit(backend.store.as_ref(), session, id).await?;
    let uid = require_identity(session)?.uid.clone();
    let item = form.validate()?;

    let image_url = match image {
        Some(image) => Some(upload_image(backend, &uid, image, progress).await?),
        None => existing.image_url.clone(),
    };

    let updated = Product {
        name: item.name,
        description: item.description,
        category: item.category,
        price: item.price,
        quantity: item.quantity,
        image_url,
        ..existing
    };
    backend
        .store
        .write_one(PRODUCTS_COLLECTION, id.as_str(), to_fields(&updated.to_record())?)
        .await?;

    tracing::info!("Item updated");
    Ok(updated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use artisan_backend::memory::MemoryBackend;
    use artisan_backend::{AuthService, Identity};
    use artisan_core::{Credentials, Email};
    use rust_decimal::Decimal;

    use super::*;

    fn form() -> ItemForm {
        ItemForm {
            name: "Terracotta lamp".to_string(),
            description: "Hand thrown".to_string(),
            category: "pottery".to_string(),
            price: "450.50".to_string(),
            quantity: "4".to_string(),
        }
    }

    fn seller_session(uid: &UserId) -> Session {
        Session::resolved(
            Some(Identity::new(
                uid.clone(),
                Some(Email::parse("maker@example.com").unwrap()),
            )),
            Some(artisan_core::Role::Seller),
        )
    }

    async fn signed_in(memory: &MemoryBackend) -> Session {
        let uid = memory.auth.add_account("maker@example.com", "secret1").unwrap();
        memory
            .auth
            .sign_in(&Credentials::new("maker@example.com", "secret1").unwrap())
            .await
            .unwrap();
        seller_session(&uid)
    }

    #[test]
    fn test_validation() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.category, Category::Pottery);
        assert_eq!(valid.price.amount(), Decimal::new(45050, 2));
        assert_eq!(valid.quantity, 4);

        let err = ItemForm::default().validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["name", "category", "price", "quantity"])
        );

        let mut bad = form();
        bad.price = "0".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::Invalid { field: "price", .. })
        ));

        let mut bad = form();
        bad.quantity = "2.5".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::Invalid { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_image_path_and_content_type() {
        assert_eq!(
            image_path(&UserId::new("u1"), 1_700_000_000_000, "lamp.PNG"),
            "products/u1_1700000000000_lamp.PNG"
        );
        assert_eq!(ImageFile::new("lamp.PNG", vec![]).content_type, "image/png");
        assert_eq!(
            ImageFile::new("notes", vec![]).content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_add_item_uploads_then_writes() {
        let memory = MemoryBackend::new();
        let session = signed_in(&memory).await;
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let product = add_item(
            &memory.backend(),
            &session,
            &form(),
            Some(ImageFile::new("lamp.jpg", vec![1, 2, 3, 4])),
            Some(tx),
        )
        .await
        .unwrap();

        let paths = memory.storage.paths();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("products/user-1_"));
        assert_eq!(product.image_url.as_deref(), Some(format!("memory://{}", paths[0]).as_str()));
        assert_eq!(product.seller_email.as_deref(), Some("maker@example.com"));

        let stored = memory.store.documents("products");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].str_field("sellerId"), Some("user-1"));

        let mut last = 0;
        while let Ok(progress) = rx.try_recv() {
            last = progress.percent();
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn test_failed_upload_writes_nothing() {
        let memory = MemoryBackend::new();
        let session = signed_in(&memory).await;
        memory.storage.set_fail_uploads(true);

        let err = add_item(
            &memory.backend(),
            &session,
            &form(),
            Some(ImageFile::new("lamp.jpg", vec![1, 2, 3])),
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(err.user_message(), "Failed to upload image. Please try again.");
        assert!(memory.store.documents("products").is_empty());
    }

    #[tokio::test]
    async fn test_add_item_requires_identity() {
        let memory = MemoryBackend::new();
        let err = add_item(
            &memory.backend(),
            &Session::resolved(None, None),
            &form(),
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_edit_keeps_owner_and_creation_time() {
        let memory = MemoryBackend::new();
        let session = signed_in(&memory).await;
        let backend = memory.backend();
        let created = add_item(&backend, &session, &form(), None, None)
            .await
            .unwrap();

        let mut edited = ItemForm::from(&created);
        edited.price = "500".to_string();
        let updated = update_item(&backend, &session, &created.id, &edited, None, None)
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.seller_id, created.seller_id);
        let reread = load_for_edit(backend.store.as_ref(), &session, &created.id)
            .await
            .unwrap();
        assert_eq!(reread.price.amount(), Decimal::from(500));
    }

    #[tokio::test]
    async fn test_edit_of_foreign_product_is_forbidden() {
        let memory = MemoryBackend::new();
        let session = signed_in(&memory).await;
        memory.store.insert(
            "products",
            "p9",
            serde_json::json!({ "name": "Not mine", "price": 10, "sellerId": "someone-else" })
                .as_object()
                .cloned()
                .unwrap(),
        );

        let err = load_for_edit(memory.store.as_ref(), &session, &ProductId::new("p9"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = load_for_edit(memory.store.as_ref(), &session, &ProductId::new("zz"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Product not found");
    }
}
