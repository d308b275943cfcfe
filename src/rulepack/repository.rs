//! CRUD for rulepacks and their SIT-version selections.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;

use super::model::Rulepack;

pub struct NewRulepack<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub description: Option<&'a str>,
    pub publisher: Option<&'a str>,
    pub locale: Option<&'a str>,
}

pub fn create_rulepack(conn: &Connection, new: NewRulepack<'_>) -> Result<Rulepack> {
    let rulepack = Rulepack {
        id: Uuid::new_v4(),
        name: new.name.to_string(),
        version: new.version.to_string(),
        description: new.description.map(str::to_string),
        publisher: new.publisher.map(str::to_string),
        locale: new.locale.map(str::to_string),
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO rulepack (id, name, version, description, publisher, locale, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            rulepack.id.to_string(),
            rulepack.name,
            rulepack.version,
            rulepack.description,
            rulepack.publisher,
            rulepack.locale,
            rulepack.created_at.to_rfc3339(),
        ],
    )?;
    Ok(rulepack)
}

pub fn get_rulepack(conn: &Connection, id: Uuid) -> Result<Option<Rulepack>> {
    conn.query_row(
        "SELECT id, name, version, description, publisher, locale, created_at
         FROM rulepack WHERE id = ?1",
        params![id.to_string()],
        row_to_rulepack,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list_rulepacks(conn: &Connection) -> Result<Vec<Rulepack>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, version, description, publisher, locale, created_at
         FROM rulepack ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], row_to_rulepack)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Replace a rulepack's SIT-version selections with exactly the given set,
/// matching the original's delete-then-insert semantics.
pub fn set_selections(conn: &mut Connection, rulepack_id: Uuid, sit_version_ids: &[Uuid]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM rulepack_selection WHERE rulepack_id = ?1",
        params![rulepack_id.to_string()],
    )?;
    for sit_version_id in sit_version_ids {
        tx.execute(
            "INSERT INTO rulepack_selection (rulepack_id, sit_version_id) VALUES (?1, ?2)",
            params![rulepack_id.to_string(), sit_version_id.to_string()],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// List the SIT version ids currently selected into a rulepack.
pub fn list_selections(conn: &Connection, rulepack_id: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT sit_version_id FROM rulepack_selection WHERE rulepack_id = ?1",
    )?;
    let rows = stmt.query_map(params![rulepack_id.to_string()], |row| {
        let id: String = row.get(0)?;
        Ok(id.parse::<Uuid>().unwrap_or_default())
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

fn row_to_rulepack(row: &rusqlite::Row) -> rusqlite::Result<Rulepack> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(6)?;
    Ok(Rulepack {
        id: id.parse().unwrap_or_default(),
        name: row.get(1)?,
        version: row.get(2)?,
        description: row.get(3)?,
        publisher: row.get(4)?,
        locale: row.get(5)?,
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_selections_replaces_prior_set() {
        let mut conn = crate::db::open(":memory:").unwrap();
        let rulepack = create_rulepack(
            &conn,
            NewRulepack {
                name: "Default",
                version: "1",
                description: None,
                publisher: None,
                locale: None,
            },
        )
        .unwrap();

        let sit = crate::sit::repository::create_sit(&conn, "SSN", None).unwrap();
        let v1 = crate::sit::repository::create_version(
            &mut conn,
            sit.id,
            crate::sit::repository::NewVersion {
                entity_type: None,
                confidence: None,
                source: None,
                primary_element: crate::sit::PrimaryElement::Regex("x".to_string()),
                supporting_logic: crate::sit::SupportingLogic::Any,
                supporting_groups: vec![],
            },
        )
        .unwrap();

        set_selections(&mut conn, rulepack.id, &[v1.id]).unwrap();
        assert_eq!(list_selections(&conn, rulepack.id).unwrap(), vec![v1.id]);

        set_selections(&mut conn, rulepack.id, &[]).unwrap();
        assert!(list_selections(&conn, rulepack.id).unwrap().is_empty());
    }
}
