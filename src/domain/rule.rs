//! Access rules as fetched from a layer's rulebase

use super::track::TrackSnapshot;
use crate::mgmt::types::{
    NamedObject, RulebaseEntry, RulebasePage, ENTRY_ACCESS_RULE, ENTRY_ACCESS_SECTION,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// UID -> name lookup returned alongside a rulebase fetch. Rebuilt on every fetch.
#[derive(Debug, Clone, Default)]
pub struct ObjectDictionary {
    names: HashMap<String, String>,
}

impl ObjectDictionary {
    pub fn from_objects(objects: &[NamedObject]) -> Self {
        let names = objects
            .iter()
            .filter_map(|obj| Some((obj.uid.clone()?, obj.name.clone()?)))
            .collect();
        Self { names }
    }

    pub fn name_of(&self, uid: &str) -> Option<&str> {
        self.names.get(uid).map(String::as_str)
    }
}

/// An access rule in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub uid: String,
    /// Display name; not unique, may be absent
    pub name: Option<String>,
    /// 1-based index within the flattened rule list
    pub position: usize,
    /// Track setting at fetch time
    pub track: TrackSnapshot,
}

impl AccessRule {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("(unnamed)")
    }
}

/// Flatten a rulebase page into its rules.
///
/// Sections are expanded one level deep and then dropped; only
/// `access-rule` entries survive. Positions are assigned in the resulting
/// order, starting at 1.
pub fn flatten_rulebase(page: &RulebasePage) -> Vec<AccessRule> {
    let dictionary = ObjectDictionary::from_objects(&page.objects_dictionary);
    debug!(
        entries = page.rulebase.len(),
        objects = page.objects_dictionary.len(),
        "flattening rulebase"
    );
    if let Some(total) = page.truncated_total() {
        warn!(
            to = ?page.to,
            total,
            "rulebase page is truncated, later rules cannot be selected"
        );
    }

    let leaves = page.rulebase.iter().flat_map(|entry| {
        if entry.entry_type == ENTRY_ACCESS_SECTION {
            entry.rulebase.iter().collect::<Vec<_>>()
        } else {
            vec![entry]
        }
    });

    leaves
        .filter(|entry| entry.entry_type == ENTRY_ACCESS_RULE)
        .filter_map(with_uid)
        .enumerate()
        .map(|(i, (uid, entry))| AccessRule {
            uid,
            name: entry.name.clone(),
            position: i + 1,
            track: TrackSnapshot::from_field(entry.track.as_ref(), &dictionary),
        })
        .collect()
}

fn with_uid(entry: &RulebaseEntry) -> Option<(String, &RulebaseEntry)> {
    match &entry.uid {
        Some(uid) if !uid.is_empty() => Some((uid.clone(), entry)),
        _ => {
            warn!(name = ?entry.name, "skipping access rule without uid");
            None
        }
    }
}
