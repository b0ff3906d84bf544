use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::{JwtConfig, JwtService, MemoryCodeStore, VerificationCodeStore, hash_password};
use crate::core::tasks::{BackgroundTasks, CODE_PURGE_INTERVAL, purge_codes_loop};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::admin_user;
use crate::orders::OrderService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt | JWT 认证服务 |
/// | codes | 短信验证码存储 |
/// | orders | 订单生命周期服务 |
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub jwt: Arc<JwtService>,
    pub codes: Arc<dyn VerificationCodeStore>,
    pub orders: OrderService,
}

impl AppState {
    /// 打开数据库并组装状态
    pub async fn initialize(config: Config) -> Result<Self> {
        let db = DbService::connect(&config.database_url).await?;
        let state = Self::with_pool(config, db.pool);
        state.bootstrap_admin().await?;
        Ok(state)
    }

    /// 使用已有连接池组装状态 (测试使用内存库)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt = JwtService::with_config(JwtConfig {
            secret: config.jwt_secret.clone(),
            expiration_minutes: config.access_token_expire_minutes,
        });
        Self {
            orders: OrderService::new(pool.clone()),
            config: Arc::new(config),
            pool,
            jwt: Arc::new(jwt),
            codes: Arc::new(MemoryCodeStore::new()),
        }
    }

    /// 验证码有效期
    pub fn code_ttl(&self) -> Duration {
        let minutes = u64::try_from(self.config.code_expire_minutes).unwrap_or(5);
        Duration::from_secs(minutes * 60)
    }

    /// 首次启动时根据配置创建管理员
    pub async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(username), Some(password)) =
            (&self.config.admin_username, &self.config.admin_password)
        else {
            return Ok(());
        };

        let count = admin_user::count(&self.pool)
            .await
            .map_err(|e| ServerError::Init(e.to_string()))?;
        if count > 0 {
            return Ok(());
        }

        let hash = hash_password(password).map_err(|e| ServerError::Init(e.to_string()))?;
        admin_user::create(&self.pool, username, &hash)
            .await
            .map_err(|e| ServerError::Init(e.to_string()))?;
        tracing::info!(username = %username, "Bootstrap admin created");
        Ok(())
    }

    /// 启动后台任务
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn(
            "code_purge",
            purge_codes_loop(self.codes.clone(), CODE_PURGE_INTERVAL, tasks.shutdown_token()),
        );
        tracing::info!(count = tasks.len(), "Background tasks started");
        tasks
    }
}
