//! Bulk import of personas and groups from a JSON seed document.

use persona_core::{Group, Persona};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::group::upsert_group;
use crate::persona::upsert_persona;

/// A seed document: `{"personas": [...], "groups": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub personas: Vec<Persona>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Counts of records written by [`import_seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub personas: usize,
    pub groups: usize,
}

impl SeedDocument {
    /// Parse a seed document and validate every persona in it.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SeedDocument = serde_json::from_str(json)?;

        for persona in &document.personas {
            persona.validate()?;
        }

        for group in &document.groups {
            if let Some(narrator) = &group.narrator_id {
                if !group.member_persona_ids.contains(narrator) {
                    return Err(DatabaseError::Invalid {
                        entity: "Group",
                        reason: format!("{}: narrator {} is not a member", group.id, narrator),
                    });
                }
            }
        }

        Ok(document)
    }
}

/// Upsert every persona, then every group.
pub async fn import_seed(pool: &SqlitePool, document: &SeedDocument) -> Result<SeedSummary> {
    for persona in &document.personas {
        upsert_persona(pool, persona).await?;
    }

    for group in &document.groups {
        upsert_group(pool, group).await?;
    }

    let summary = SeedSummary {
        personas: document.personas.len(),
        groups: document.groups.len(),
    };
    tracing::info!(
        "Imported seed: {} personas, {} groups",
        summary.personas,
        summary.groups
    );

    Ok(summary)
}
