//! HTTP implementation of the remote list service.
//!
//! Speaks JSON with camelCase fields and authenticates every request with a
//! bearer token. Paginated endpoints are queried with `perPage=-1` so a
//! single response holds everything.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RemoteError, RemoteListService, RemoteResult, DATE_FORMAT};
use crate::models::{
    Food, ItemMutations, ItemUpdate, ListDetail, MealPlanEntry, NewItem, ShoppingList,
    ShoppingListItem,
};

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const LISTS_PATH: &str = "/api/households/shopping/lists";
const ITEMS_PATH: &str = "/api/households/shopping/items";
const MEALPLANS_PATH: &str = "/api/households/mealplans";
const FOODS_PATH: &str = "/api/foods";

/// How many foods a search returns.
const FOOD_SEARCH_LIMIT: u32 = 20;

/// Paginated response envelope.
#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateItemBody<'a> {
    shopping_list_id: Uuid,
    #[serde(flatten)]
    item: &'a NewItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecipeImport {
    recipe_id: Uuid,
}

/// Remote list service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpListService {
    server_url: String,
    api_token: String,
    client: Client,
}

impl HttpListService {
    /// Creates a client with the default request timeout.
    pub fn new(server_url: String, api_token: String) -> RemoteResult<Self> {
        Self::with_timeout(server_url, api_token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: String,
        api_token: String,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            server_url,
            api_token,
            client,
        })
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Builds an HTTP URL for a given path.
    fn build_url(&self, path: &str) -> String {
        let base_url = if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_token)
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "remote call");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> RemoteResult<()> {
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl RemoteListService for HttpListService {
    async fn fetch_lists(&self) -> RemoteResult<Vec<ShoppingList>> {
        let request = self
            .client
            .get(self.build_url(LISTS_PATH))
            .query(&[("perPage", "-1"), ("orderBy", "name")]);
        let page: Page<ShoppingList> = self.send_json(request).await?;
        Ok(page.items)
    }

    async fn fetch_list_detail(&self, list_id: Uuid) -> RemoteResult<ListDetail> {
        let url = self.build_url(&format!("{}/{}", LISTS_PATH, list_id));
        self.send_json(self.client.get(url)).await
    }

    async fn create_list(&self, name: Option<&str>) -> RemoteResult<ListDetail> {
        let body = ListBody { id: None, name };
        let request = self.client.post(self.build_url(LISTS_PATH)).json(&body);
        self.send_json(request).await
    }

    async fn update_list(&self, list_id: Uuid, name: Option<&str>) -> RemoteResult<ListDetail> {
        let body = ListBody {
            id: Some(list_id),
            name,
        };
        let url = self.build_url(&format!("{}/{}", LISTS_PATH, list_id));
        self.send_json(self.client.put(url).json(&body)).await
    }

    async fn delete_list(&self, list_id: Uuid) -> RemoteResult<()> {
        let url = self.build_url(&format!("{}/{}", LISTS_PATH, list_id));
        self.send_empty(self.client.delete(url)).await
    }

    async fn create_item(&self, list_id: Uuid, item: &NewItem) -> RemoteResult<ItemMutations> {
        let body = CreateItemBody {
            shopping_list_id: list_id,
            item,
        };
        let request = self.client.post(self.build_url(ITEMS_PATH)).json(&body);
        self.send_json(request).await
    }

    async fn update_item(&self, update: &ItemUpdate) -> RemoteResult<ShoppingListItem> {
        let url = self.build_url(&format!("{}/{}", ITEMS_PATH, update.id));
        let mutations: ItemMutations = self.send_json(self.client.put(url).json(update)).await?;

        mutations
            .updated_items
            .into_iter()
            .find(|item| item.id == update.id)
            .ok_or_else(|| RemoteError::Decode("updated item missing from response".to_string()))
    }

    async fn delete_item(&self, item_id: Uuid) -> RemoteResult<()> {
        let url = self.build_url(&format!("{}/{}", ITEMS_PATH, item_id));
        self.send_empty(self.client.delete(url)).await
    }

    async fn fetch_meal_plan_entries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RemoteResult<Vec<MealPlanEntry>> {
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();
        let request = self.client.get(self.build_url(MEALPLANS_PATH)).query(&[
            ("start_date", start.as_str()),
            ("end_date", end.as_str()),
            ("perPage", "-1"),
        ]);
        let page: Page<MealPlanEntry> = self.send_json(request).await?;
        Ok(page.items)
    }

    async fn bulk_add_recipes_to_list(
        &self,
        list_id: Uuid,
        recipe_ids: &[Uuid],
    ) -> RemoteResult<()> {
        let body: Vec<RecipeImport> = recipe_ids
            .iter()
            .map(|&recipe_id| RecipeImport { recipe_id })
            .collect();
        let url = self.build_url(&format!("{}/{}/recipe", LISTS_PATH, list_id));
        self.send_empty(self.client.post(url).json(&body)).await
    }

    async fn search_foods(&self, query: &str) -> RemoteResult<Vec<Food>> {
        let per_page = FOOD_SEARCH_LIMIT.to_string();
        let request = self
            .client
            .get(self.build_url(FOODS_PATH))
            .query(&[("search", query), ("perPage", per_page.as_str())]);
        let page: Page<Food> = self.send_json(request).await?;
        Ok(page.items)
    }
}
