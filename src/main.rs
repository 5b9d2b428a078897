use consignment_ledger::{
    config,
    core::{clock::SystemClock, report, seller},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load seed sellers
    let seed_config = config::sellers::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;
    info!(
        sellers = seed_config.sellers.len(),
        default_shipping_fee = seed_config.default_shipping_fee,
        "Configuration loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db).await?;

    // 5. Seed sellers missing from the directory
    seller::seed_sellers(&db, &SystemClock, &seed_config.sellers)
        .await
        .inspect_err(|e| error!("Failed to seed sellers: {}", e))?;

    // 6. Print the current debt of every seller
    for line in report::debt_summary(&db).await? {
        info!("{line}");
    }

    Ok(())
}
