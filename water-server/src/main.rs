use water_server::{Config, Server, init_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 环境变量 (.env 可选)
    let _ = dotenvy::dotenv();

    // 2. 加载配置
    let config = Config::from_env()?;

    // 3. 日志
    init_logger(&config.log_level, config.log_dir.as_deref())?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Water server starting...");

    // 4. 启动 HTTP 服务器 (Server::run 会启动后台任务)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
