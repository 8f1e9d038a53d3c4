use chrono::TimeDelta;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fiscal={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;

    let engine = engine::Engine::builder()
        .database(db)
        .secret_key(server.secret_key)
        .access_token_ttl(TimeDelta::minutes(server.access_token_minutes))
        .refresh_token_ttl(TimeDelta::minutes(server.refresh_token_minutes))
        .build()
        .await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let options = server::ServerOptions {
        prefix: server.prefix,
        public_url: server
            .public_url
            .unwrap_or_else(|| format!("http://{addr}")),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server::run_with_listener(engine, options, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
