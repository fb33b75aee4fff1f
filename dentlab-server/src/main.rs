//! 技工所病例服务主程序

use anyhow::{Context, Result};
use clap::Parser;
use dentlab_admin::{init_logging, DatabaseBackend, LabConfig};
use dentlab_database::{DatabasePool, DatabaseQueries, MemoryStore};
use dentlab_web::WebServer;
use dentlab_workflow::LabService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// 服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "dentlab-server")]
#[command(about = "Dental lab case tracking REST server")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机，覆盖配置文件
    #[arg(long)]
    host: Option<String>,

    /// 服务器端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long)]
    log_level: Option<String>,

    /// 打印默认配置（TOML）后退出
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", LabConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = LabConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.host, args.port, args.log_level)?;

    // 初始化日志
    init_logging(&config.logging)?;

    info!("启动技工所服务器...");
    info!("配置来源: {}", args.config.as_deref().unwrap_or("默认值/dentlab.toml"));
    info!("服务器配置:");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  存储后端: {:?}", config.database.backend);

    let service = Arc::new(build_service(&config).await?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.host))?;
    let server = WebServer::new(addr, service, config.server.cors_permissive);

    if let Err(e) = server.run().await {
        error!("服务器异常退出: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// 按配置选择存储后端
async fn build_service(config: &LabConfig) -> Result<LabService> {
    match config.database.backend {
        DatabaseBackend::Memory => {
            info!("使用内存存储，重启后数据丢失");
            Ok(LabService::with_store(Arc::new(MemoryStore::new())))
        }
        DatabaseBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            let pool = DatabasePool::connect(url, config.database.max_connections).await?;
            let queries = DatabaseQueries::new(pool);
            if config.database.auto_create_tables {
                queries.create_tables().await?;
            }
            Ok(LabService::with_store(Arc::new(queries)))
        }
    }
}
