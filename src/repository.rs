use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Team,
    Venue,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Team => "team",
            EntityKind::Venue => "venue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    AllTime,
    AtVenue,
    VsTeam,
    VsPlayer,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::AllTime => "all_time",
            Scope::AtVenue => "at_venue",
            Scope::VsTeam => "vs_team",
            Scope::VsPlayer => "vs_player",
        }
    }
}

/// Self-describing envelope around every persisted stats payload, so the
/// query layer can evolve without knowing how records were computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord<T> {
    pub kind: EntityKind,
    pub entity: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_key: Option<String>,
    pub computed_at: String,
    pub stats: T,
}

/// File-per-key JSON repository under a root directory:
/// `<root>/<kind>/<scope>/<entity>[/<scope key>].json`. Writes go to a
/// `.tmp` sibling first and are swapped in by rename, so a reader never
/// observes a partially written record. Re-running the pipeline overwrites
/// each key wholesale.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    root: PathBuf,
}

impl StatsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn put<T: Serialize>(
        &self,
        kind: EntityKind,
        entity: &str,
        scope: Scope,
        scope_key: Option<&str>,
        stats: &T,
    ) -> Result<()> {
        let record = StoredRecord {
            kind,
            entity: entity.to_string(),
            scope,
            scope_key: scope_key.map(|s| s.to_string()),
            computed_at: Utc::now().to_rfc3339(),
            stats,
        };

        let path = self.record_path(kind, entity, scope, scope_key);
        let parent = path
            .parent()
            .with_context(|| format!("record path {} has no parent", path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create stats dir {}", parent.display()))?;

        let json = serde_json::to_string_pretty(&record).context("serialize stats record")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write stats record {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("swap stats record {}", path.display()))?;
        debug!(path = %path.display(), "stats record written");
        Ok(())
    }

    /// `Ok(None)` when no record exists at the key.
    pub fn get<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        entity: &str,
        scope: Scope,
        scope_key: Option<&str>,
    ) -> Result<Option<StoredRecord<T>>> {
        let path = self.record_path(kind, entity, scope, scope_key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read stats record {}", path.display()));
            }
        };
        let record = serde_json::from_str(&raw)
            .with_context(|| format!("decode stats record {}", path.display()))?;
        Ok(Some(record))
    }

    fn record_path(
        &self,
        kind: EntityKind,
        entity: &str,
        scope: Scope,
        scope_key: Option<&str>,
    ) -> PathBuf {
        let mut path = self.root.join(kind.as_str()).join(scope.as_str());
        match scope_key {
            Some(key) => {
                path.push(slug(entity));
                path.push(format!("{}.json", slug(key)));
            }
            None => path.push(format!("{}.json", slug(entity))),
        }
        path
    }
}

/// Entity and scope-key names become path components; anything outside
/// ASCII alphanumerics is folded to `_` so venue names with slashes or
/// commas stay valid filenames.
pub fn slug(raw: &str) -> String {
    let slugged: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if slugged.is_empty() {
        "_".to_string()
    } else {
        slugged
    }
}
