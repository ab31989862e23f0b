use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = alchemy_server::Config::parse();
    tracing::info!("alchemy-server v{}", env!("CARGO_PKG_VERSION"));
    alchemy_server::serve(config).await
}
