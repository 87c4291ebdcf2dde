//! SQLite persistence layer for the persona chat gateway.
//!
//! This crate stores personas, groups, conversations, and turns using SQLx
//! with SQLite, and implements [`persona_core::ConversationStore`] for
//! [`Database`].
//!
//! # Example
//!
//! ```no_run
//! use database::{persona, Database};
//! use persona_core::{GenerationParams, Persona};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:personas.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Store a persona
//!     let pip = Persona {
//!         id: "pip".to_string(),
//!         display_name: "Pip".to_string(),
//!         system_instruction: "You are Pip, a wooden puppet.".to_string(),
//!         style_hints: None,
//!         generation_params: GenerationParams::default(),
//!         fallback_lines: vec!["*creaks* the gears of the world skipped a beat".to_string()],
//!     };
//!     persona::upsert_persona(db.pool(), &pip).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod group;
pub mod models;
pub mod persona;
pub mod seed;
pub mod turn;

mod store;

pub use error::{DatabaseError, Result};
pub use models::{ConversationRow, GroupRow, PersonaRow, TurnRow};
pub use seed::{import_seed, SeedDocument, SeedSummary};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/personas.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use persona_core::{GenerationParams, Group, Persona};

    pub async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    pub fn persona(id: &str, name: &str) -> Persona {
        Persona {
            id: id.to_string(),
            display_name: name.to_string(),
            system_instruction: format!("You are {}.", name),
            style_hints: None,
            generation_params: GenerationParams::new(0.7, 400),
            fallback_lines: vec![format!("*{} pauses* Say that once more?", name)],
        }
    }

    pub fn group(id: &str, members: &[&str], narrator: Option<&str>) -> Group {
        Group {
            id: id.to_string(),
            name: format!("Group {}", id),
            scenario: "A smoky tavern on a rainy night.".to_string(),
            member_persona_ids: members.iter().map(|m| m.to_string()).collect(),
            narrator_id: narrator.map(str::to_string),
        }
    }
}
