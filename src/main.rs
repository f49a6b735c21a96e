use std::error::Error;
use std::sync::{Arc, Mutex};

use rocket::fs::FileServer;
use tracing_subscriber::EnvFilter;

use nest::data::{open_database, DBConnection};

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = std::env::var("NEST_DB").unwrap_or_else(|_| "nest.db".to_string());
    tracing::info!(path = %db_path, "opening database");

    let connection = open_database(&db_path)?;
    let connection: DBConnection = Arc::new(Mutex::new(connection));

    nest::build_api(connection)
        .mount(
            "/",
            FileServer::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")).rank(15),
        )
        .launch()
        .await?;

    Ok(())
}
