//! 服务器配置
//!
//! 读取顺序：可选 YAML 文件 (`CONFIG_PATH`, 默认 `config/config.yaml`)，
//! 然后环境变量覆盖同名配置项。

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML in config file: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("{0} must be set in {1} environment")]
    MissingSecret(&'static str, String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// YAML 配置文件结构 (所有字段可选)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub environment: Option<String>,
    pub http_port: Option<u16>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub access_token_expire_minutes: Option<i64>,
    pub code_expire_minutes: Option<i64>,
    pub cors_origins: Option<Vec<String>>,
    pub upload_dir: Option<String>,
    pub public_base_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub log_dir: Option<String>,
    pub log_level: Option<String>,
}

impl FileConfig {
    /// 读取 YAML 文件，文件不存在时返回空配置
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_norway::from_str(&content)?)
    }
}

/// 服务器配置
///
/// | 环境变量 | 默认值 |
/// |----------|--------|
/// | ENVIRONMENT | development |
/// | HTTP_PORT | 8000 |
/// | DATABASE_URL | sqlite:water.db |
/// | JWT_SECRET | (development 下自动生成占位) |
/// | ACCESS_TOKEN_EXPIRE_MINUTES | 30 |
/// | CODE_EXPIRE_MINUTES | 5 |
/// | CORS_ORIGINS | * |
/// | UPLOAD_DIR | uploads |
/// | PUBLIC_BASE_URL | http://localhost:8000 |
/// | ADMIN_USERNAME / ADMIN_PASSWORD | - |
/// | LOG_DIR / LOG_LEVEL | - / info |
#[derive(Debug, Clone)]
pub struct Config {
    /// development | production
    pub environment: String,
    pub http_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    /// 验证码有效期 (分钟)
    pub code_expire_minutes: i64,
    pub cors_origins: Vec<String>,
    pub upload_dir: PathBuf,
    /// 上传文件对外访问的基础地址
    pub public_base_url: String,
    /// 首次启动时创建的管理员
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub log_dir: Option<String>,
    pub log_level: String,
}

impl Config {
    /// 从配置文件和进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".into());
        let file = FileConfig::load(Path::new(&path))?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// 合并配置文件与变量查找函数 (查找结果优先)
    pub fn from_sources(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .or(file.environment)
            .unwrap_or_else(|| "development".into());

        let http_port = match get("HTTP_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "HTTP_PORT",
                value: v,
            })?,
            None => file.http_port.unwrap_or(8000),
        };

        let access_token_expire_minutes =
            parse_minutes(get("ACCESS_TOKEN_EXPIRE_MINUTES"), "ACCESS_TOKEN_EXPIRE_MINUTES")?
                .or(file.access_token_expire_minutes)
                .unwrap_or(30);
        let code_expire_minutes = parse_minutes(get("CODE_EXPIRE_MINUTES"), "CODE_EXPIRE_MINUTES")?
            .or(file.code_expire_minutes)
            .unwrap_or(5);

        let jwt_secret = Self::require_secret(
            "JWT_SECRET",
            get("JWT_SECRET").or(file.jwt_secret),
            &environment,
        )?;

        let cors_origins = match get("CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => file.cors_origins.unwrap_or_else(|| vec!["*".to_string()]),
        };

        Ok(Self {
            http_port,
            database_url: get("DATABASE_URL")
                .or(file.database_url)
                .unwrap_or_else(|| "sqlite:water.db".into()),
            jwt_secret,
            access_token_expire_minutes,
            code_expire_minutes,
            cors_origins,
            upload_dir: PathBuf::from(
                get("UPLOAD_DIR")
                    .or(file.upload_dir)
                    .unwrap_or_else(|| "uploads".into()),
            ),
            public_base_url: get("PUBLIC_BASE_URL")
                .or(file.public_base_url)
                .unwrap_or_else(|| "http://localhost:8000".into())
                .trim_end_matches('/')
                .to_string(),
            admin_username: get("ADMIN_USERNAME").or(file.admin_username),
            admin_password: get("ADMIN_PASSWORD").or(file.admin_password),
            log_dir: get("LOG_DIR").or(file.log_dir),
            log_level: get("LOG_LEVEL")
                .or(file.log_level)
                .unwrap_or_else(|| "info".into()),
            environment,
        })
    }

    /// 密钥在非 development 环境下必须显式配置
    fn require_secret(
        name: &'static str,
        value: Option<String>,
        environment: &str,
    ) -> Result<String, ConfigError> {
        match value {
            Some(v) => Ok(v),
            None if environment == "development" => Ok(format!("dev-{name}-not-for-production")),
            None => Err(ConfigError::MissingSecret(name, environment.to_string())),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 上传文件的公开访问地址
    pub fn public_file_url(&self, file_name: &str) -> String {
        format!("{}/static/{}", self.public_base_url, file_name)
    }
}

fn parse_minutes(value: Option<String>, key: &'static str) -> Result<Option<i64>, ConfigError> {
    match value {
        Some(v) => match v.parse::<i64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
        None => Ok(None),
    }
}
