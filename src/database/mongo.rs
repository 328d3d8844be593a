//! MongoDB connection.

use anyhow::Context;
use mongodb::bson::doc;
use mongodb::{Client, Collection, options::ClientOptions};
use tracing::info;

/// Handle to the bot's MongoDB database.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect and ping `db_name` so a bad URI fails at startup.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the server is unreachable.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("invalid MongoDB connection string")?;
        options.app_name = Some("lobbyist".to_string());

        let client = Client::with_options(options)?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("failed to reach MongoDB database '{}'", db_name))?;

        info!(database = db_name, "Connected to MongoDB");
        Ok(Self { db })
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
