use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

use agentdock::api::{build_cors, configure_routes, AppState, CONSOLE_PERMISSIONS};
use agentdock::config::ConfigLoader;
use agentdock::db::{DatabaseManager, SchemaSynchronizer, SeedData};
use agentdock::errors::ErrorHandlerMiddleware;
use agentdock::logging::LoggingSetup;
use agentdock::services::PermissionService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 初始化配置
    let config = ConfigLoader::init().context("加载配置失败")?;

    // 文件日志的写线程守卫需要持有到进程退出
    let _log_guard = LoggingSetup::init(&config.logging)?;

    tracing::info!("🚀 启动 AgentDock v{}", config.environment.version);

    let manager = DatabaseManager::init(config.database.clone())
        .await
        .context("连接数据库失败")?;
    let db = manager.get_connection().clone();

    if config.database.synchronize {
        SchemaSynchronizer::sync(&db).await.context("同步表结构失败")?;
    }

    let report = PermissionService::new(db.clone())
        .sync(CONSOLE_PERMISSIONS)
        .await
        .context("同步权限失败")?;
    tracing::info!(
        added = report.added,
        updated = report.updated,
        removed = report.removed,
        "权限目录已同步"
    );

    if config.database.seed {
        SeedData::run(&db, config).await.context("写入初始数据失败")?;
    }

    if config.is_development() {
        println!("{}", ConfigLoader::summary(config));
    }

    let server_config = config.server.clone();
    let security = config.security.clone();
    let state = AppState::new(db, config.clone());

    tracing::info!("🌐 服务器启动地址: http://{}:{}", server_config.host, server_config.port);
    tracing::info!("📋 接口文档: http://{}:{}/docs/", server_config.host, server_config.port);

    let routes = server_config.clone();
    let mut server = HttpServer::new(move || {
        let routes = routes.clone();
        App::new()
            .wrap(build_cors(&security))
            .wrap(ErrorHandlerMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(move |cfg| configure_routes(cfg, &routes))
    })
    .keep_alive(Duration::from_secs(server_config.keep_alive))
    .client_request_timeout(Duration::from_millis(server_config.client_timeout));

    if let Some(workers) = server_config.workers {
        server = server.workers(workers);
    }

    server
        .bind((server_config.host.clone(), server_config.port))?
        .run()
        .await?;

    Ok(())
}
