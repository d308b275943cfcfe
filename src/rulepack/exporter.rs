//! Builds Microsoft Purview-compatible rulepack XML from a set of selected
//! SIT versions, validating the rule graph before any XML is written.

use std::io::Cursor;

use regex::Regex;
use rusqlite::{params, Connection};
use uuid::Uuid;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{DlpError, Result};
use crate::sit::{PrimaryElement, SitVersion, SupportingItem, SupportingLogic};

use super::model::Rulepack;

const NAMESPACE: &str = "https://schemas.microsoft.com/office/2011/mce";

fn fetch_sit(conn: &Connection, sit_id: Uuid) -> Result<(String, Option<String>)> {
    conn.query_row(
        "SELECT name, description FROM sit WHERE id = ?1",
        params![sit_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Into::into)
}

/// A version paired with the name/description of the SIT it belongs to,
/// used both for export attributes and to sort deterministically.
struct SortableVersion {
    sit_name: String,
    sit_description: Option<String>,
    version: SitVersion,
}

fn sorted_versions(conn: &Connection, versions: Vec<SitVersion>) -> Result<Vec<SortableVersion>> {
    let mut sortable = Vec::with_capacity(versions.len());
    for version in versions {
        let (sit_name, sit_description) = fetch_sit(conn, version.sit_id)?;
        sortable.push(SortableVersion {
            sit_name,
            sit_description,
            version,
        });
    }
    sortable.sort_by(|a, b| {
        a.sit_name
            .cmp(&b.sit_name)
            .then_with(|| a.version.version_number.cmp(&b.version.version_number))
            .then_with(|| a.version.id.cmp(&b.version.id))
    });
    Ok(sortable)
}

fn validate_regex(pattern: &str) -> Result<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| DlpError::export(format!("invalid regex '{pattern}': {e}")))
}

fn validate_supporting_logic(version: &SitVersion) -> Result<()> {
    match version.supporting_logic {
        SupportingLogic::Any => Ok(()),
        SupportingLogic::All => Ok(()),
        SupportingLogic::MinN { min_n } => {
            if min_n < 1 {
                return Err(DlpError::export(format!(
                    "sit version {} has MIN_N logic with min_n < 1",
                    version.id
                )));
            }
            Ok(())
        }
    }
}

fn validate_version(conn: &Connection, version: &SitVersion) -> Result<()> {
    match &version.primary_element {
        PrimaryElement::Regex(pattern) => validate_regex(pattern)?,
        PrimaryElement::Keyword(value) => {
            if value.trim().is_empty() {
                return Err(DlpError::export(format!(
                    "sit version {} has an empty keyword primary element",
                    version.id
                )));
            }
        }
    }
    validate_supporting_logic(version)?;

    for group in &version.supporting_groups {
        if group.items.is_empty() {
            return Err(DlpError::export(format!(
                "sit version {} has supporting group '{}' with no items",
                version.id, group.name
            )));
        }
        for item in &group.items {
            match item {
                SupportingItem::Regex { value } => validate_regex(value)?,
                SupportingItem::Keyword { value } => {
                    if value.trim().is_empty() {
                        return Err(DlpError::export(format!(
                            "sit version {} has an empty keyword supporting item",
                            version.id
                        )));
                    }
                }
                SupportingItem::KeywordListRef { keyword_list_id } => {
                    let count: i64 = conn.query_row(
                        "SELECT count(*) FROM keyword_list_item WHERE keyword_list_id = ?1",
                        params![keyword_list_id.to_string()],
                        |row| row.get(0),
                    )?;
                    if count == 0 {
                        return Err(DlpError::export(format!(
                            "supporting item references missing or empty keyword list {keyword_list_id}"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve a supporting item to the literal text Purview matches against:
/// keyword list references are expanded to their comma-joined values.
fn resolve_supporting_item(conn: &Connection, item: &SupportingItem) -> Result<(&'static str, String)> {
    match item {
        SupportingItem::Regex { value } => Ok(("Regex", value.clone())),
        SupportingItem::Keyword { value } => Ok(("Keyword", value.clone())),
        SupportingItem::KeywordListRef { keyword_list_id } => {
            let mut stmt = conn.prepare(
                "SELECT value FROM keyword_list_item WHERE keyword_list_id = ?1 ORDER BY position ASC",
            )?;
            let values = stmt
                .query_map(params![keyword_list_id.to_string()], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(("Keyword", values.join(",")))
        }
    }
}

fn xml_err(e: impl std::fmt::Display) -> DlpError {
    DlpError::export(format!("xml write error: {e}"))
}

/// Validate and serialize a rulepack's selected SIT versions into
/// Purview-compatible rulepack XML. The `<?xml ...?>` declaration is
/// written literally (single-quoted, lowercase `utf-8`) to match the exact
/// external contract rather than whatever `quick_xml`'s own declaration
/// writer would produce.
pub fn build_rule_package(conn: &Connection, rulepack: &Rulepack, versions: Vec<SitVersion>) -> Result<String> {
    if versions.is_empty() {
        return Err(DlpError::export("rulepack export requires at least one selected sit version"));
    }
    for version in &versions {
        validate_version(conn, version)?;
    }
    let sorted = sorted_versions(conn, versions)?;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut root = BytesStart::new("RulePackage");
    root.push_attribute(("xmlns", NAMESPACE));
    root.push_attribute(("id", rulepack.id.to_string().as_str()));
    root.push_attribute(("name", rulepack.name.as_str()));
    root.push_attribute(("version", rulepack.version.as_str()));
    if let Some(description) = &rulepack.description {
        root.push_attribute(("description", description.as_str()));
    }
    if let Some(publisher) = &rulepack.publisher {
        root.push_attribute(("publisher", publisher.as_str()));
    }
    root.push_attribute(("locale", rulepack.locale.as_deref().unwrap_or("en-us")));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("Rules")))
        .map_err(xml_err)?;

    for sortable in &sorted {
        write_entity(&mut writer, conn, sortable)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Rules")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("RulePackage")))
        .map_err(xml_err)?;

    let bytes = writer.into_inner().into_inner();
    let body = String::from_utf8(bytes).map_err(|e| DlpError::export(format!("non-utf8 xml output: {e}")))?;
    Ok(format!("<?xml version='1.0' encoding='utf-8'?>\n{body}"))
}

fn write_entity(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    conn: &Connection,
    sortable: &SortableVersion,
) -> Result<()> {
    let version = &sortable.version;

    let mut entity = BytesStart::new("Entity");
    entity.push_attribute(("id", version.id.to_string().as_str()));
    entity.push_attribute(("name", sortable.sit_name.as_str()));
    if let Some(description) = &sortable.sit_description {
        entity.push_attribute(("description", description.as_str()));
    }
    let confidence = version.confidence.as_deref().unwrap_or("medium");
    entity.push_attribute(("recommendedConfidence", confidence));
    writer.write_event(Event::Start(entity)).map_err(xml_err)?;

    let (primary_type, primary_value) = match &version.primary_element {
        PrimaryElement::Regex(v) => ("Regex", v.clone()),
        PrimaryElement::Keyword(v) => ("Keyword", v.clone()),
    };
    let mut pattern = BytesStart::new("Pattern");
    pattern.push_attribute(("type", primary_type));
    pattern.push_attribute(("value", primary_value.as_str()));
    writer.write_event(Event::Empty(pattern)).map_err(xml_err)?;

    if !version.supporting_groups.is_empty() {
        let mode = version.supporting_logic.mode_str();
        let mut logic = BytesStart::new("SupportingElements");
        logic.push_attribute(("mode", mode));
        if let SupportingLogic::MinN { min_n } = version.supporting_logic {
            logic.push_attribute(("minN", min_n.to_string().as_str()));
        }
        writer.write_event(Event::Start(logic)).map_err(xml_err)?;

        for group in &version.supporting_groups {
            for item in &group.items {
                let (item_type, value) = resolve_supporting_item(conn, item)?;
                let mut item_el = BytesStart::new("SupportingElement");
                item_el.push_attribute(("type", item_type));
                item_el.push_attribute(("value", value.as_str()));
                item_el.push_attribute(("group", group.name.as_str()));
                writer.write_event(Event::Empty(item_el)).map_err(xml_err)?;
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new("SupportingElements")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Entity")))
        .map_err(xml_err)?;

    Ok(())
}

/// Parse supporting-logic validation input independent of persistence, used
/// when an API-style caller validates a draft version before saving it.
/// Supporting groups are optional for every mode; only `MIN_N`'s `min_n`
/// has its own constraint (`>= 1`), matching `validate_supporting_logic`.
pub fn validate_supporting_logic_input(mode: &str, min_n: Option<u32>) -> Result<()> {
    match mode {
        "ANY" => Ok(()),
        "ALL" => Ok(()),
        "MIN_N" => {
            let min_n = min_n.ok_or_else(|| DlpError::export("MIN_N logic requires min_n"))?;
            if min_n < 1 {
                return Err(DlpError::export("MIN_N logic requires min_n >= 1"));
            }
            Ok(())
        }
        other => Err(DlpError::export(format!("unknown supporting logic mode '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sit::repository::{self, NewSupportingGroup, NewVersion};
    use crate::sit::{PrimaryElement, SupportingItem, SupportingLogic};

    #[test]
    fn exports_sorted_alphabetically_by_sit_name() {
        let mut conn = crate::db::open(":memory:").unwrap();

        let beta = repository::create_sit(&conn, "Beta", None).unwrap();
        let alpha = repository::create_sit(&conn, "Alpha", None).unwrap();

        let beta_version = repository::create_version(
            &mut conn,
            beta.id,
            NewVersion {
                entity_type: Some("BETA".to_string()),
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex("beta-pattern".to_string()),
                supporting_logic: SupportingLogic::Any,
                supporting_groups: vec![],
            },
        )
        .unwrap();

        let alpha_version = repository::create_version(
            &mut conn,
            alpha.id,
            NewVersion {
                entity_type: Some("ALPHA".to_string()),
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex(r"\d{3}-\d{2}-\d{4}".to_string()),
                supporting_logic: SupportingLogic::MinN { min_n: 2 },
                supporting_groups: vec![NewSupportingGroup {
                    name: "cards".to_string(),
                    items: vec![SupportingItem::Keyword {
                        value: "visa".to_string(),
                    }],
                }],
            },
        )
        .unwrap();

        let rulepack = crate::rulepack::repository::create_rulepack(
            &conn,
            crate::rulepack::repository::NewRulepack {
                name: "Default",
                version: "1.0",
                description: None,
                publisher: None,
                locale: None,
            },
        )
        .unwrap();

        let xml = build_rule_package(
            &conn,
            &rulepack,
            vec![beta_version.clone(), alpha_version.clone()],
        )
        .unwrap();

        let alpha_pos = xml.find("Alpha").unwrap();
        let beta_pos = xml.find("Beta").unwrap();
        assert!(alpha_pos < beta_pos);
        assert!(xml.contains("minN=\"2\""));
        assert!(xml.contains("visa"));
    }

    #[test]
    fn min_n_without_groups_exports_without_supporting_elements() {
        let mut conn = crate::db::open(":memory:").unwrap();
        let sit = repository::create_sit(&conn, "Test", None).unwrap();
        let version = repository::create_version(
            &mut conn,
            sit.id,
            NewVersion {
                entity_type: None,
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex("x".to_string()),
                supporting_logic: SupportingLogic::MinN { min_n: 1 },
                supporting_groups: vec![],
            },
        )
        .unwrap();

        let rulepack = crate::rulepack::repository::create_rulepack(
            &conn,
            crate::rulepack::repository::NewRulepack {
                name: "Default",
                version: "1.0",
                description: None,
                publisher: None,
                locale: None,
            },
        )
        .unwrap();

        let xml = build_rule_package(&conn, &rulepack, vec![version]).unwrap();
        assert!(!xml.contains("SupportingElements"));
    }

    #[test]
    fn rejects_min_n_below_one() {
        let mut conn = crate::db::open(":memory:").unwrap();
        let sit = repository::create_sit(&conn, "Test", None).unwrap();
        let version = repository::create_version(
            &mut conn,
            sit.id,
            NewVersion {
                entity_type: None,
                confidence: None,
                source: None,
                primary_element: PrimaryElement::Regex("x".to_string()),
                supporting_logic: SupportingLogic::MinN { min_n: 0 },
                supporting_groups: vec![],
            },
        )
        .unwrap();

        let rulepack = crate::rulepack::repository::create_rulepack(
            &conn,
            crate::rulepack::repository::NewRulepack {
                name: "Default",
                version: "1.0",
                description: None,
                publisher: None,
                locale: None,
            },
        )
        .unwrap();

        let result = build_rule_package(&conn, &rulepack, vec![version]);
        assert!(result.is_err());
    }
}
