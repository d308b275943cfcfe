//! CRUD and version management for SITs, keyword lists, and the rule graph
//! a version carries, implemented as explicit SQL over `rusqlite`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{DlpError, Result};

use super::model::{
    KeywordList, KeywordListItem, PrimaryElement, Sit, SitVersion, SupportingGroup,
    SupportingItem, SupportingLogic,
};

/// Input shape for creating a new SIT version: the caller supplies the rule
/// graph, the repository assigns ids and the next version number.
pub struct NewVersion {
    pub entity_type: Option<String>,
    pub confidence: Option<String>,
    pub source: Option<String>,
    pub primary_element: PrimaryElement,
    pub supporting_logic: SupportingLogic,
    pub supporting_groups: Vec<NewSupportingGroup>,
}

pub struct NewSupportingGroup {
    pub name: String,
    pub items: Vec<SupportingItem>,
}

/// Create a new SIT.
pub fn create_sit(conn: &Connection, name: &str, description: Option<&str>) -> Result<Sit> {
    let sit = Sit {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.map(str::to_string),
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO sit (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            sit.id.to_string(),
            sit.name,
            sit.description,
            sit.created_at.to_rfc3339()
        ],
    )?;
    Ok(sit)
}

/// Create a keyword list with its ordered items.
pub fn create_keyword_list(
    conn: &mut Connection,
    name: &str,
    description: Option<&str>,
    items: &[String],
) -> Result<KeywordList> {
    let tx = conn.transaction()?;
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    tx.execute(
        "INSERT INTO keyword_list (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), name, description, created_at.to_rfc3339()],
    )?;

    let mut stored_items = Vec::with_capacity(items.len());
    for (position, value) in items.iter().enumerate() {
        let item_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO keyword_list_item (id, keyword_list_id, position, value)
             VALUES (?1, ?2, ?3, ?4)",
            params![item_id.to_string(), id.to_string(), position as i64, value],
        )?;
        stored_items.push(KeywordListItem {
            id: item_id,
            keyword_list_id: id,
            position: position as u32,
            value: value.clone(),
        });
    }
    tx.commit()?;

    Ok(KeywordList {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        created_at,
        items: stored_items,
    })
}

/// List all keyword lists with their items, ordered by name.
pub fn list_keyword_lists(conn: &Connection) -> Result<Vec<KeywordList>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, created_at FROM keyword_list ORDER BY name ASC",
    )?;
    let lists = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let created_at: String = row.get(3)?;
            Ok((
                id.parse::<Uuid>().unwrap_or_default(),
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                created_at,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(lists.len());
    for (id, name, description, created_at) in lists {
        let items = load_keyword_list_items(conn, id)?;
        out.push(KeywordList {
            id,
            name,
            description,
            created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
            items,
        });
    }
    Ok(out)
}

fn load_keyword_list_items(conn: &Connection, keyword_list_id: Uuid) -> Result<Vec<KeywordListItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, position, value FROM keyword_list_item
         WHERE keyword_list_id = ?1 ORDER BY position ASC",
    )?;
    let items = stmt
        .query_map(params![keyword_list_id.to_string()], |row| {
            let id: String = row.get(0)?;
            Ok(KeywordListItem {
                id: id.parse().unwrap_or_default(),
                keyword_list_id,
                position: row.get::<_, i64>(1)? as u32,
                value: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Create a new version for `sit_id`, assigning it `max(version_number) + 1`
/// within a transaction so concurrent callers never collide.
pub fn create_version(conn: &mut Connection, sit_id: Uuid, new_version: NewVersion) -> Result<SitVersion> {
    let tx = conn.transaction()?;

    let next_version_number: i64 = tx
        .query_row(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM sit_version WHERE sit_id = ?1",
            params![sit_id.to_string()],
            |row| row.get(0),
        )?;

    let version_id = Uuid::new_v4();
    let created_at = Utc::now();
    tx.execute(
        "INSERT INTO sit_version (id, sit_id, version_number, entity_type, confidence, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            version_id.to_string(),
            sit_id.to_string(),
            next_version_number,
            new_version.entity_type,
            new_version.confidence,
            new_version.source,
            created_at.to_rfc3339(),
        ],
    )?;

    let (element_type, element_value) = match &new_version.primary_element {
        PrimaryElement::Regex(v) => ("regex", v.clone()),
        PrimaryElement::Keyword(v) => ("keyword", v.clone()),
    };
    tx.execute(
        "INSERT INTO sit_primary_element (sit_version_id, element_type, value) VALUES (?1, ?2, ?3)",
        params![version_id.to_string(), element_type, element_value],
    )?;

    let (mode, min_n) = match new_version.supporting_logic {
        SupportingLogic::Any => ("ANY", None),
        SupportingLogic::All => ("ALL", None),
        SupportingLogic::MinN { min_n } => ("MIN_N", Some(min_n as i64)),
    };
    tx.execute(
        "INSERT INTO sit_supporting_logic (sit_version_id, mode, min_n) VALUES (?1, ?2, ?3)",
        params![version_id.to_string(), mode, min_n],
    )?;

    let mut stored_groups = Vec::with_capacity(new_version.supporting_groups.len());
    for (position, group) in new_version.supporting_groups.into_iter().enumerate() {
        let group_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO sit_supporting_group (id, sit_version_id, name, position)
             VALUES (?1, ?2, ?3, ?4)",
            params![group_id.to_string(), version_id.to_string(), group.name, position as i64],
        )?;

        let mut stored_items = Vec::with_capacity(group.items.len());
        for (item_position, item) in group.items.into_iter().enumerate() {
            let item_id = Uuid::new_v4();
            let (item_type, value, keyword_list_id): (&str, Option<String>, Option<String>) =
                match &item {
                    SupportingItem::Regex { value } => ("regex", Some(value.clone()), None),
                    SupportingItem::Keyword { value } => ("keyword", Some(value.clone()), None),
                    SupportingItem::KeywordListRef { keyword_list_id } => {
                        ("keyword_list_ref", None, Some(keyword_list_id.to_string()))
                    }
                };
            tx.execute(
                "INSERT INTO sit_supporting_item (id, group_id, item_type, value, keyword_list_id, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    item_id.to_string(),
                    group_id.to_string(),
                    item_type,
                    value,
                    keyword_list_id,
                    item_position as i64,
                ],
            )?;
            stored_items.push(item);
        }

        stored_groups.push(SupportingGroup {
            id: group_id,
            sit_version_id: version_id,
            name: group.name,
            position: position as u32,
            items: stored_items,
        });
    }

    tx.commit()?;

    Ok(SitVersion {
        id: version_id,
        sit_id,
        version_number: next_version_number as u32,
        entity_type: new_version.entity_type,
        confidence: new_version.confidence,
        source: new_version.source,
        created_at,
        primary_element: new_version.primary_element,
        supporting_logic: new_version.supporting_logic,
        supporting_groups: stored_groups,
    })
}

/// Load full versions (primary element, supporting logic, supporting
/// groups and items) for a set of version ids, in the order requested.
pub fn get_versions_by_ids(conn: &Connection, ids: &[Uuid]) -> Result<Vec<SitVersion>> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        match load_version(conn, *id)? {
            Some(version) => out.push(version),
            None => {
                return Err(DlpError::export(format!(
                    "sit version {id} referenced but not found"
                )))
            }
        }
    }
    Ok(out)
}

fn load_version(conn: &Connection, version_id: Uuid) -> Result<Option<SitVersion>> {
    let row: Option<(Uuid, i64, Option<String>, Option<String>, Option<String>, String)> = conn
        .query_row(
            "SELECT sit_id, version_number, entity_type, confidence, source, created_at
             FROM sit_version WHERE id = ?1",
            params![version_id.to_string()],
            |row| {
                let sit_id: String = row.get(0)?;
                Ok((
                    sit_id.parse().unwrap_or_default(),
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .optional()?;

    let Some((sit_id, version_number, entity_type, confidence, source, created_at)) = row else {
        return Ok(None);
    };

    let (element_type, element_value): (String, String) = conn.query_row(
        "SELECT element_type, value FROM sit_primary_element WHERE sit_version_id = ?1",
        params![version_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let primary_element = match element_type.as_str() {
        "keyword" => PrimaryElement::Keyword(element_value),
        _ => PrimaryElement::Regex(element_value),
    };

    let (mode, min_n): (String, Option<i64>) = conn.query_row(
        "SELECT mode, min_n FROM sit_supporting_logic WHERE sit_version_id = ?1",
        params![version_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let supporting_logic = match mode.as_str() {
        "ALL" => SupportingLogic::All,
        "MIN_N" => SupportingLogic::MinN {
            min_n: min_n.unwrap_or(1) as u32,
        },
        _ => SupportingLogic::Any,
    };

    let supporting_groups = load_supporting_groups(conn, version_id)?;

    Ok(Some(SitVersion {
        id: version_id,
        sit_id,
        version_number: version_number as u32,
        entity_type,
        confidence,
        source,
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
        primary_element,
        supporting_logic,
        supporting_groups,
    }))
}

fn load_supporting_groups(conn: &Connection, version_id: Uuid) -> Result<Vec<SupportingGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, position FROM sit_supporting_group
         WHERE sit_version_id = ?1 ORDER BY position ASC",
    )?;
    let groups = stmt
        .query_map(params![version_id.to_string()], |row| {
            let id: String = row.get(0)?;
            Ok((
                id.parse::<Uuid>().unwrap_or_default(),
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? as u32,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(groups.len());
    for (id, name, position) in groups {
        let items = load_supporting_items(conn, id)?;
        out.push(SupportingGroup {
            id,
            sit_version_id: version_id,
            name,
            position,
            items,
        });
    }
    Ok(out)
}

fn load_supporting_items(conn: &Connection, group_id: Uuid) -> Result<Vec<SupportingItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_type, value, keyword_list_id FROM sit_supporting_item
         WHERE group_id = ?1 ORDER BY position ASC",
    )?;
    let items = stmt
        .query_map(params![group_id.to_string()], |row| {
            let item_type: String = row.get(0)?;
            let value: Option<String> = row.get(1)?;
            let keyword_list_id: Option<String> = row.get(2)?;
            Ok((item_type, value, keyword_list_id))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items
        .into_iter()
        .map(|(item_type, value, keyword_list_id)| match item_type.as_str() {
            "keyword" => SupportingItem::Keyword {
                value: value.unwrap_or_default(),
            },
            "keyword_list_ref" => SupportingItem::KeywordListRef {
                keyword_list_id: keyword_list_id
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            _ => SupportingItem::Regex {
                value: value.unwrap_or_default(),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_two_versions_with_incrementing_numbers() {
        let mut conn = crate::db::open(":memory:").unwrap();
        let sit = create_sit(&conn, "SSN", None).unwrap();

        let v1 = create_version(
            &mut conn,
            sit.id,
            NewVersion {
                entity_type: Some("SSN".to_string()),
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex(r"\d{3}-\d{2}-\d{4}".to_string()),
                supporting_logic: SupportingLogic::Any,
                supporting_groups: vec![],
            },
        )
        .unwrap();
        assert_eq!(v1.version_number, 1);

        let v2 = create_version(
            &mut conn,
            sit.id,
            NewVersion {
                entity_type: Some("SSN".to_string()),
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex(r"\d{3}-\d{2}-\d{4}".to_string()),
                supporting_logic: SupportingLogic::MinN { min_n: 2 },
                supporting_groups: vec![NewSupportingGroup {
                    name: "context".to_string(),
                    items: vec![SupportingItem::Keyword {
                        value: "social".to_string(),
                    }],
                }],
            },
        )
        .unwrap();
        assert_eq!(v2.version_number, 2);

        let loaded = get_versions_by_ids(&conn, &[v2.id]).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].supporting_groups.len(), 1);
        assert_eq!(loaded[0].supporting_groups[0].items.len(), 1);
    }

    #[test]
    fn keyword_list_round_trips() {
        let mut conn = crate::db::open(":memory:").unwrap();
        let list = create_keyword_list(
            &mut conn,
            "card brands",
            None,
            &["visa".to_string(), "mastercard".to_string()],
        )
        .unwrap();

        let lists = list_keyword_lists(&conn).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, list.id);
        assert_eq!(lists[0].items.len(), 2);
        assert_eq!(lists[0].items[0].value, "visa");
    }
}
