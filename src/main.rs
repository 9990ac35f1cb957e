use anyhow::Result;
use clap::Parser;
use sentiment_uam_schema::{cli::Cli, config, mongo_client, setup};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Cargar configuración (entorno + argumentos)
    let cfg = Cli::parse().apply(config::AppConfig::from_env()?);

    info!("============================================================================");
    info!("Inicializando MongoDB para SentimentInsightUAM");
    info!("============================================================================");

    // 3. Conectar a MongoDB
    let db = mongo_client::connect_from_config(&cfg).await?;

    // 4. Esquema, índices, estadísticas y usuario
    let report = setup::run(&db, &cfg).await?;

    info!("✅ Inicialización de MongoDB completada");
    println!("{}", report.stats);
    println!();
    println!("{report}");
    Ok(())
}
