// Application configuration, loaded once at startup and passed around
// explicitly via AppState. Sources, in order of precedence:
// defaults -> config.toml (optional) -> VAMCAR_* environment variables.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Upstream Carapis API base, e.g. https://api.carapis.com
    pub api_url: String,
    // API key injected server-side; never rendered into pages
    pub api_key: Option<String>,
    // Public origin of this deployment, used for absolute links when set
    pub public_url: Option<String>,
    pub app: AppInfo,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("api_url", "https://api.carapis.com")?
            .set_default("app.name", "VamCar")?
            .set_default("app.title", "VamCar - Best car search engine")?
            .set_default("app.description", "Best car search engine")?
            .set_default("app.version", env!("CARGO_PKG_VERSION"))?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., VAMCAR_API_KEY)
            .add_source(Environment::with_prefix("VAMCAR").separator("__"));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}
