//! # Catalog Commands
//!
//! Read-only access to the item catalog. Administration of the catalog
//! (creating items, editing prices) happens outside this workflow; these
//! reads exist so storefront clients can build carts.

use tracing::debug;

use storefront_core::validation::validate_id;
use storefront_core::Item;

use crate::error::ServiceError;
use crate::response::Response;
use crate::Storefront;

impl Storefront {
    /// Lists all catalog items.
    pub async fn list_items(&self) -> Response<Vec<Item>> {
        self.list_items_inner()
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn list_items_inner(&self) -> Result<Response<Vec<Item>>, ServiceError> {
        debug!("list_items command");

        let items = self.db.items().list_all().await?;
        Ok(Response::ok_with("Items retrieved successfully", items))
    }

    /// Gets a single item by id.
    pub async fn get_item(&self, item_id: &str) -> Response<Item> {
        self.get_item_inner(item_id)
            .await
            .unwrap_or_else(Response::from_error)
    }

    async fn get_item_inner(&self, item_id: &str) -> Result<Response<Item>, ServiceError> {
        debug!(item_id = %item_id, "get_item command");

        validate_id("item id", item_id)?;

        let item = self
            .db
            .items()
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", item_id))?;

        Ok(Response::ok_with("Item retrieved successfully", item))
    }
}
