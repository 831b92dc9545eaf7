// Access layer for the Carapis Encar vehicle API.
//
// Two operations: list vehicles with filters, retrieve one vehicle by
// listing id. In a server-rendering context the client talks to the
// upstream base directly and attaches the API key itself; a browser-side
// embedding goes through the same-origin /apix proxy, which injects the
// key so it never reaches the client. Errors propagate unchanged; there is
// no retry and no cache here.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};

use crate::config::Settings;
use crate::filters::CatalogQuery;
use crate::models::{VehicleDetail, VehicleListPage};

pub const API_KEY_HEADER: &str = "X-API-Key";
const VEHICLES_PATH: &str = "/apix/data/encar/api/vehicles/web/";

// The seam between the catalog provider and the network; the provider is
// generic over it so tests can script responses.
pub trait VehicleApi {
    fn list_vehicles(
        &self,
        query: &CatalogQuery,
    ) -> impl Future<Output = Result<VehicleListPage>> + Send;

    // Ok(None) when the listing id is unknown upstream.
    fn get_vehicle(
        &self,
        listing_id: &str,
    ) -> impl Future<Output = Result<Option<VehicleDetail>>> + Send;
}

pub struct EncarClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl EncarClient {
    // Server-rendering context: talk to the upstream directly, attach the
    // configured API key on every request.
    pub fn direct(settings: &Settings, http: Client) -> Self {
        Self {
            http,
            base_url: trim_base(&settings.api_url),
            api_key: settings.api_key.clone(),
        }
    }

    // Browser context: same-origin requests through the /apix proxy, which
    // owns the key.
    pub fn proxied(origin: &str, http: Client) -> Self {
        Self {
            http,
            base_url: trim_base(origin),
            api_key: None,
        }
    }

    fn list_url(&self) -> String {
        format!("{}{}", self.base_url, VEHICLES_PATH)
    }

    fn detail_url(&self, listing_id: &str) -> String {
        format!("{}{}{}/", self.base_url, VEHICLES_PATH, listing_id)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        request
    }
}

impl VehicleApi for EncarClient {
    async fn list_vehicles(&self, query: &CatalogQuery) -> Result<VehicleListPage> {
        let url = self.list_url();
        tracing::debug!(url = %url, page = query.page, "Fetching vehicle list");

        let response = self
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Failed to reach the vehicle list API")?
            .error_for_status()?;

        response
            .json::<VehicleListPage>()
            .await
            .context("Failed to parse vehicle list response")
    }

    async fn get_vehicle(&self, listing_id: &str) -> Result<Option<VehicleDetail>> {
        let url = self.detail_url(listing_id);
        tracing::debug!(url = %url, "Fetching vehicle detail");

        let response = self
            .get(&url)
            .send()
            .await
            .context("Failed to reach the vehicle detail API")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let vehicle = response
            .error_for_status()?
            .json::<VehicleDetail>()
            .await
            .context("Failed to parse vehicle detail response")?;
        Ok(Some(vehicle))
    }
}
