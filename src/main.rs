use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use ipweather::{AppState, config::Config, limiter::UpstreamLimits, routes};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 加载配置，缺少天气 API key 时直接退出
    let (config, config_warnings) = match Config::from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Obtain and set WU_KEY first ({})", e);
            std::process::exit(1);
        }
    };

    // 初始化日志：终端 + 日志文件
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map(Arc::new);
    let file_layer = log_file.as_ref().ok().map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::clone(file))
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    if let Err(e) = &log_file {
        tracing::warn!("Cannot open log file {}: {}", config.log_file.display(), e);
    }
    // 加载配置时日志还没有初始化，这里补上
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    // 创建缓存和静态文件目录
    for dir in [&config.resp_dir, &config.static_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Cannot create {}: {}", dir.display(), e);
        }
    }

    // 恢复上游 API 的调用计数
    let limits = UpstreamLimits::load(&config);

    let state = AppState::new(config.clone(), &limits).expect("Failed to initialize application");
    let app = routes::create_router(state);

    // 第一个命令行参数可以覆盖监听地址
    let addr = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<SocketAddr>().unwrap_or_else(|_| {
            tracing::warn!("Invalid listen address {:?}, using configuration", arg);
            configured_addr(&config)
        }),
        None => configured_addr(&config),
    };

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    limits.save(&config);
}

fn configured_addr(config: &Config) -> SocketAddr {
    SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down, saving limiter state");
}
