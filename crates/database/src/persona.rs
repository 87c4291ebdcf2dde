//! Persona persistence.

use persona_core::Persona;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::PersonaRow;

/// Insert a persona or replace the stored definition with the same id.
///
/// The persona is validated first.
pub async fn upsert_persona(pool: &SqlitePool, persona: &Persona) -> Result<()> {
    persona.validate()?;
    let fallback_lines = serde_json::to_string(&persona.fallback_lines)?;

    sqlx::query(
        r#"
        INSERT INTO personas
            (id, display_name, system_instruction, style_hints,
             temperature, max_output_tokens, fallback_lines)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            system_instruction = excluded.system_instruction,
            style_hints = excluded.style_hints,
            temperature = excluded.temperature,
            max_output_tokens = excluded.max_output_tokens,
            fallback_lines = excluded.fallback_lines,
            updated_at = datetime('now')
        "#,
    )
    .bind(&persona.id)
    .bind(&persona.display_name)
    .bind(&persona.system_instruction)
    .bind(&persona.style_hints)
    .bind(persona.generation_params.temperature)
    .bind(i64::from(persona.generation_params.max_output_tokens))
    .bind(fallback_lines)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a persona by ID.
pub async fn get_persona(pool: &SqlitePool, id: &str) -> Result<Persona> {
    sqlx::query_as::<_, PersonaRow>(
        r#"
        SELECT id, display_name, system_instruction, style_hints,
               temperature, max_output_tokens, fallback_lines
        FROM personas
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Persona", id))?
    .into_persona()
}

/// List all personas ordered by id.
pub async fn list_personas(pool: &SqlitePool) -> Result<Vec<Persona>> {
    let rows = sqlx::query_as::<_, PersonaRow>(
        r#"
        SELECT id, display_name, system_instruction, style_hints,
               temperature, max_output_tokens, fallback_lines
        FROM personas
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PersonaRow::into_persona).collect()
}

/// Delete a persona by ID.
pub async fn delete_persona(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM personas WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Persona", id));
    }

    Ok(())
}
