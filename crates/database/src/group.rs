//! Group persistence.

use persona_core::Group;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::GroupRow;

/// Insert or replace a group together with its member list.
///
/// Members must already exist as personas.
pub async fn upsert_group(pool: &SqlitePool, group: &Group) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO persona_groups (id, name, scenario, narrator_id)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            scenario = excluded.scenario,
            narrator_id = excluded.narrator_id,
            updated_at = datetime('now')
        "#,
    )
    .bind(&group.id)
    .bind(&group.name)
    .bind(&group.scenario)
    .bind(&group.narrator_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM group_members WHERE group_id = ?")
        .bind(&group.id)
        .execute(&mut *tx)
        .await?;

    for persona_id in &group.member_persona_ids {
        sqlx::query("INSERT INTO group_members (group_id, persona_id) VALUES (?, ?)")
            .bind(&group.id)
            .bind(persona_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.is_foreign_key_violation() {
                        return DatabaseError::not_found("Persona", persona_id.as_str());
                    }
                }
                DatabaseError::Sqlx(e)
            })?;
    }

    tx.commit().await?;
    Ok(())
}

/// Get a group and its members by ID.
pub async fn get_group(pool: &SqlitePool, id: &str) -> Result<Group> {
    let row = sqlx::query_as::<_, GroupRow>(
        r#"
        SELECT id, name, scenario, narrator_id
        FROM persona_groups
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Group", id))?;

    let members: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT persona_id
        FROM group_members
        WHERE group_id = ?
        ORDER BY persona_id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Group {
        id: row.id,
        name: row.name,
        scenario: row.scenario,
        member_persona_ids: members.into_iter().collect(),
        narrator_id: row.narrator_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::upsert_persona;
    use crate::test_support::{group, persona, test_db};

    #[tokio::test]
    async fn test_group_roundtrip_and_member_replacement() {
        let db = test_db().await;
        for (id, name) in [("mags", "Mags"), ("pip", "Pip"), ("otto", "Otto")] {
            upsert_persona(db.pool(), &persona(id, name)).await.unwrap();
        }

        let tavern = group("tavern", &["mags", "pip"], Some("mags"));
        upsert_group(db.pool(), &tavern).await.unwrap();
        assert_eq!(get_group(db.pool(), "tavern").await.unwrap(), tavern);

        let reshuffled = group("tavern", &["otto", "pip"], None);
        upsert_group(db.pool(), &reshuffled).await.unwrap();
        let fetched = get_group(db.pool(), "tavern").await.unwrap();
        assert_eq!(fetched.member_persona_ids, reshuffled.member_persona_ids);
        assert_eq!(fetched.narrator_id, None);
    }

    #[tokio::test]
    async fn test_unknown_member_is_rejected() {
        let db = test_db().await;
        upsert_persona(db.pool(), &persona("pip", "Pip")).await.unwrap();

        let result = upsert_group(db.pool(), &group("tavern", &["ghost", "pip"], None)).await;
        assert!(matches!(
            result,
            Err(DatabaseError::NotFound { entity: "Persona", ref id }) if id == "ghost"
        ));
        assert!(matches!(
            get_group(db.pool(), "tavern").await,
            Err(DatabaseError::NotFound { entity: "Group", .. })
        ));
    }
}
