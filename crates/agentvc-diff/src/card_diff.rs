//! Card-level diff: compare two agent card snapshots.

use std::collections::HashMap;

use agentvc_types::{AgentCard, Skill};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DiffError, DiffResult};

/// Top-level fields that participate in a diff, in report order.
pub const DIFFED_FIELDS: &[&str] = &[
    "name",
    "description",
    "url",
    "version",
    "protocolVersion",
    "documentationUrl",
    "iconUrl",
    "publicKey",
    "provider",
    "capabilities",
    "defaultInputModes",
    "defaultOutputModes",
];

/// One changed top-level field.
///
/// Absent optional fields are reported as `Value::Null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Value,
    pub new: Value,
}

/// The result of comparing two cards.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CardDiff {
    pub fields: Vec<FieldChange>,
    /// Skills only in the new card, in new-card order.
    pub skills_added: Vec<Skill>,
    /// Skills only in the old card, in old-card order.
    pub skills_removed: Vec<Skill>,
    /// Skills in both cards whose records differ, in new-card order.
    pub skills_modified: Vec<Skill>,
}

impl CardDiff {
    /// Returns `true` if anything differs.
    pub fn changed(&self) -> bool {
        !self.fields.is_empty()
            || !self.skills_added.is_empty()
            || !self.skills_removed.is_empty()
            || !self.skills_modified.is_empty()
    }

    /// Total number of reported changes.
    pub fn len(&self) -> usize {
        self.fields.len()
            + self.skills_added.len()
            + self.skills_removed.len()
            + self.skills_modified.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.changed()
    }

    /// Look up the change for a field by its wire name.
    pub fn field(&self, name: &str) -> Option<&FieldChange> {
        self.fields.iter().find(|c| c.field == name)
    }
}

fn to_value<T: Serialize>(field: &str, value: &T) -> DiffResult<Value> {
    serde_json::to_value(value).map_err(|e| DiffError::Serialization(format!("{field}: {e}")))
}

fn compare<T: Serialize + PartialEq>(
    out: &mut Vec<FieldChange>,
    field: &'static str,
    old: &T,
    new: &T,
) -> DiffResult<()> {
    if old != new {
        out.push(FieldChange {
            field,
            old: to_value(field, old)?,
            new: to_value(field, new)?,
        });
    }
    Ok(())
}

/// Compute the diff between two cards.
///
/// Scalars and mode lists are compared by value, `provider` and
/// `capabilities` as whole objects, and skills by `id` membership.
pub fn diff_cards(old: &AgentCard, new: &AgentCard) -> DiffResult<CardDiff> {
    let mut fields = Vec::new();

    compare(&mut fields, "name", &old.name, &new.name)?;
    compare(&mut fields, "description", &old.description, &new.description)?;
    compare(&mut fields, "url", &old.url, &new.url)?;
    compare(&mut fields, "version", &old.version, &new.version)?;
    compare(&mut fields, "protocolVersion", &old.protocol_version, &new.protocol_version)?;
    compare(&mut fields, "documentationUrl", &old.documentation_url, &new.documentation_url)?;
    compare(&mut fields, "iconUrl", &old.icon_url, &new.icon_url)?;
    compare(&mut fields, "publicKey", &old.public_key, &new.public_key)?;
    compare(&mut fields, "provider", &old.provider, &new.provider)?;
    compare(&mut fields, "capabilities", &old.capabilities, &new.capabilities)?;
    compare(&mut fields, "defaultInputModes", &old.default_input_modes, &new.default_input_modes)?;
    compare(&mut fields, "defaultOutputModes", &old.default_output_modes, &new.default_output_modes)?;

    let old_skills: HashMap<&str, &Skill> =
        old.skills.iter().map(|s| (s.id.as_str(), s)).collect();
    let new_skills: HashMap<&str, &Skill> =
        new.skills.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut skills_added = Vec::new();
    let mut skills_modified = Vec::new();
    for skill in &new.skills {
        match old_skills.get(skill.id.as_str()) {
            None => skills_added.push(skill.clone()),
            Some(prev) if *prev != skill => skills_modified.push(skill.clone()),
            Some(_) => {}
        }
    }
    let skills_removed = old
        .skills
        .iter()
        .filter(|s| !new_skills.contains_key(s.id.as_str()))
        .cloned()
        .collect();

    Ok(CardDiff {
        fields,
        skills_added,
        skills_removed,
        skills_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentvc_types::{Capabilities, Provider};
    use serde_json::json;

    fn card_with_skills(ids: &[&str]) -> AgentCard {
        let mut card = AgentCard::new("Scout");
        card.skills = ids.iter().map(|id| Skill::new(*id, *id)).collect();
        card
    }

    #[test]
    fn identical_cards_no_diff() {
        let card = card_with_skills(&["a", "b"]);
        let diff = diff_cards(&card, &card).unwrap();
        assert!(!diff.changed());
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn skill_added_and_name_changed() {
        let old = card_with_skills(&["x"]);
        let mut new = card_with_skills(&["x", "y"]);
        new.name = "Scout II".into();

        let diff = diff_cards(&old, &new).unwrap();
        assert!(diff.changed());
        assert_eq!(diff.skills_added.len(), 1);
        assert_eq!(diff.skills_added[0].id, "y");
        assert!(diff.skills_removed.is_empty());
        assert!(diff.skills_modified.is_empty());

        let name = diff.field("name").unwrap();
        assert_eq!(name.old, json!("Scout"));
        assert_eq!(name.new, json!("Scout II"));
        assert_eq!(diff.fields.len(), 1);
    }

    #[test]
    fn removed_in_old_order_added_in_new_order() {
        let old = card_with_skills(&["c", "a", "b"]);
        let new = card_with_skills(&["e", "b", "d"]);
        let diff = diff_cards(&old, &new).unwrap();
        let ids = |v: &[Skill]| v.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&diff.skills_added), vec!["e", "d"]);
        assert_eq!(ids(&diff.skills_removed), vec!["c", "a"]);
    }

    #[test]
    fn skill_modification_detected() {
        let old = card_with_skills(&["a", "b"]);
        let mut new = old.clone();
        new.skills[1].description = "now documented".into();
        let diff = diff_cards(&old, &new).unwrap();
        assert_eq!(diff.skills_modified.len(), 1);
        assert_eq!(diff.skills_modified[0].id, "b");
        assert!(diff.fields.is_empty());
    }

    #[test]
    fn reordering_skills_is_not_a_change() {
        let old = card_with_skills(&["a", "b"]);
        let new = card_with_skills(&["b", "a"]);
        assert!(!diff_cards(&old, &new).unwrap().changed());
    }

    #[test]
    fn mode_lists_compare_as_sequences() {
        let old = AgentCard::new("a");
        let mut new = old.clone();
        new.default_input_modes = vec!["image".into(), "text".into()];
        let diff = diff_cards(&old, &new).unwrap();
        let change = diff.field("defaultInputModes").unwrap();
        assert_eq!(change.old, json!(["text"]));
        assert_eq!(change.new, json!(["image", "text"]));
    }

    #[test]
    fn nested_objects_one_entry() {
        let old = AgentCard::new("a");
        let mut new = old.clone();
        new.provider = Some(Provider {
            organization: "Acme".into(),
            ..Provider::default()
        });
        new.capabilities = Some(Capabilities {
            streaming: Some(true),
            ..Capabilities::default()
        });
        let diff = diff_cards(&old, &new).unwrap();
        let provider = diff.field("provider").unwrap();
        assert_eq!(provider.old, Value::Null);
        assert_eq!(provider.new, json!({"organization": "Acme"}));
        assert_eq!(
            diff.field("capabilities").unwrap().new,
            json!({"streaming": true})
        );
        assert_eq!(diff.fields.len(), 2);
    }

    #[test]
    fn public_key_presence_is_a_change() {
        let old = AgentCard::new("a");
        let new = old.clone().with_public_key("ed25519:AAAA");
        let diff = diff_cards(&old, &new).unwrap();
        assert_eq!(diff.field("publicKey").unwrap().new, json!("ed25519:AAAA"));
    }

    #[test]
    fn unknown_fields_are_not_diffed() {
        let old = AgentCard::new("a");
        let mut new = old.clone();
        new.extensions.insert("x-custom".into(), json!(1));
        assert!(!diff_cards(&old, &new).unwrap().changed());
    }

    #[test]
    fn field_report_order_is_fixed() {
        let old = AgentCard::new("a");
        let mut new = old.clone();
        new.version = "2".into();
        new.name = "b".into();
        new.default_output_modes.clear();
        let diff = diff_cards(&old, &new).unwrap();
        let order: Vec<_> = diff.fields.iter().map(|c| c.field).collect();
        assert_eq!(order, vec!["name", "version", "defaultOutputModes"]);
        assert!(order.iter().all(|f| DIFFED_FIELDS.contains(f)));
    }
}
