use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 发票中 CCA 章节的起始标记
pub const DEFAULT_SECTION_MARKER: &str = "Section B: CCA Details";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `/reconcile` 请求体上限 (含 base64 内容)
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub section_marker: String,
    /// 保留版面提取时使用的水平容差
    pub layout_x_tolerance: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            section_marker: DEFAULT_SECTION_MARKER.to_string(),
            layout_x_tolerance: 2.0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl AppConfig {
    /// 依次加载默认值、`awb-recon.toml` (若存在) 和 `AWB_RECON_*` 环境变量
    /// (嵌套键用 `__` 分隔, 如 `AWB_RECON_SERVER__PORT`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(
            Environment::with_prefix("AWB_RECON")
                .prefix_separator("_")
                .separator("__"),
        )?
        .build()?
        .try_deserialize()
    }

    fn builder(
        env: Environment,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Self::default();
        Ok(Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.max_body_bytes", defaults.server.max_body_bytes as i64)?
            .set_default("extraction.section_marker", defaults.extraction.section_marker)?
            .set_default(
                "extraction.layout_x_tolerance",
                defaults.extraction.layout_x_tolerance as f64,
            )?
            .add_source(File::with_name("awb-recon").required(false))
            .add_source(env))
    }
}
