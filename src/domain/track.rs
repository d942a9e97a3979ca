//! Track (logging) settings of an access rule

use super::rule::ObjectDictionary;
use crate::error::{AppError, Result};
use crate::mgmt::types::{TrackField, TrackTypeField};
use std::fmt;
use std::str::FromStr;

/// Canonical track types accepted by `set-access-rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    None,
    Log,
    DetailedLog,
    ExtendedLog,
}

impl TrackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::None => "none",
            TrackType::Log => "log",
            TrackType::DetailedLog => "detailed log",
            TrackType::ExtendedLog => "extended log",
        }
    }

    /// Map free-form operator input onto a canonical type.
    ///
    /// Matching ignores case and surrounding whitespace. Anything outside the
    /// known surface forms is rejected with the offending value.
    pub fn normalize(input: &str) -> Result<Self> {
        match input.trim().to_lowercase().as_str() {
            "none" => Ok(TrackType::None),
            "log" => Ok(TrackType::Log),
            "detailed-log" | "detail" | "detailed" | "detailed log" => Ok(TrackType::DetailedLog),
            "extended-log" | "extended" | "extend" | "extended log" => Ok(TrackType::ExtendedLog),
            _ => Err(AppError::InvalidTrackType {
                value: input.to_string(),
            }),
        }
    }

    /// Logging options only matter when something is logged.
    pub fn takes_options(&self) -> bool {
        !matches!(self, TrackType::None)
    }
}

impl FromStr for TrackType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        TrackType::normalize(s)
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired track configuration pushed to every selected rule.
///
/// The three flags are always transmitted, including for `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSpec {
    pub track_type: TrackType,
    pub accounting: bool,
    pub per_connection: bool,
    pub per_session: bool,
}

impl TrackSpec {
    pub fn new(track_type: TrackType) -> Self {
        Self {
            track_type,
            accounting: false,
            per_connection: false,
            per_session: false,
        }
    }

    pub fn with_options(
        mut self,
        accounting: bool,
        per_connection: bool,
        per_session: bool,
    ) -> Self {
        self.accounting = accounting;
        self.per_connection = per_connection;
        self.per_session = per_session;
        self
    }
}

impl fmt::Display for TrackSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_track(
            f,
            self.track_type.as_str(),
            Some(self.accounting),
            Some(self.per_connection),
            Some(self.per_session),
        )
    }
}

fn write_track(
    f: &mut fmt::Formatter<'_>,
    type_name: &str,
    accounting: Option<bool>,
    per_connection: Option<bool>,
    per_session: Option<bool>,
) -> fmt::Result {
    let enabled: Vec<&str> = [
        ("accounting", accounting),
        ("per-connection", per_connection),
        ("per-session", per_session),
    ]
    .iter()
    .filter(|(_, on)| on.unwrap_or(false))
    .map(|(label, _)| *label)
    .collect();

    if enabled.is_empty() {
        f.write_str(type_name)
    } else {
        write!(f, "{} ({})", type_name, enabled.join(", "))
    }
}

/// Where a rule's current track type is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRef {
    /// UID to look up in the object dictionary
    DirectUid(String),
    /// Object embedded in the response
    InlineObject {
        uid: Option<String>,
        name: Option<String>,
    },
}

impl TrackRef {
    /// Display name of the referenced track type.
    pub fn resolve(&self, dictionary: &ObjectDictionary) -> String {
        match self {
            TrackRef::DirectUid(uid) => dictionary
                .name_of(uid)
                .map(str::to_string)
                .unwrap_or_else(|| uid.clone()),
            TrackRef::InlineObject { uid, name } => name
                .clone()
                .or_else(|| {
                    uid.as_deref()
                        .and_then(|u| dictionary.name_of(u))
                        .map(str::to_string)
                })
                .or_else(|| uid.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// A rule's track as it was when fetched, resolved to display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub type_name: String,
    pub accounting: Option<bool>,
    pub per_connection: Option<bool>,
    pub per_session: Option<bool>,
}

impl TrackSnapshot {
    pub fn unknown() -> Self {
        Self {
            type_name: "unknown".to_string(),
            accounting: None,
            per_connection: None,
            per_session: None,
        }
    }

    /// Resolve the server's `track` value once, at fetch time.
    pub fn from_field(field: Option<&TrackField>, dictionary: &ObjectDictionary) -> Self {
        let Some(field) = field else {
            return Self::unknown();
        };

        match field {
            TrackField::Reference(uid) => Self {
                type_name: TrackRef::DirectUid(uid.clone()).resolve(dictionary),
                ..Self::unknown()
            },
            TrackField::Object(obj) => {
                let reference = match &obj.track_type {
                    Some(TrackTypeField::Reference(uid)) => TrackRef::DirectUid(uid.clone()),
                    Some(TrackTypeField::Inline(named)) => TrackRef::InlineObject {
                        uid: named.uid.clone(),
                        name: named.name.clone(),
                    },
                    None => TrackRef::InlineObject {
                        uid: obj.uid.clone(),
                        name: obj.name.clone(),
                    },
                };
                Self {
                    type_name: reference.resolve(dictionary),
                    accounting: obj.accounting,
                    per_connection: obj.per_connection,
                    per_session: obj.per_session,
                }
            }
        }
    }
}

impl fmt::Display for TrackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_track(
            f,
            &self.type_name,
            self.accounting,
            self.per_connection,
            self.per_session,
        )
    }
}
