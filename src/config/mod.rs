use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// The JSON document holding the full post collection.
    pub data_path: PathBuf,
    /// Where uploaded images land; served under the public `/img` prefix.
    pub uploads_dir: PathBuf,
    /// Image path assigned to posts created without an upload.
    pub default_image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// The shared page template every post renders through.
    pub template_path: PathBuf,
    /// Where generated pages are written and deleted from.
    pub pages_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("storage.data_path", "data/posts.json")?
            .set_default("storage.uploads_dir", "img")?
            .set_default("storage.default_image", "/img/activity-default.jpg")?
            .set_default("render.template_path", "templates/report.html")?
            .set_default("render.pages_dir", "pages")?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
