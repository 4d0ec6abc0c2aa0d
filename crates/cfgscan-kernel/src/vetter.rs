//! Version vetting: merge what an olive runs with what history says.
//!
//! Vetting is read-only. When an explicit override drifts, the caller
//! decides whether to commit the merged set back to version control.

use crate::history::History;
use crate::versions::TagSet;
use serde::Serialize;
use tracing::debug;

/// Which history decided a vetting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VetSource {
    Frozen,
    Controlled,
    Prior,
    Olive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vetting {
    pub tags: TagSet,
    /// The merged set differs from the recorded one. Never set for frozen
    /// entries.
    pub changed: bool,
    pub source: VetSource,
}

/// Reconcile `olive_tags` for `workflow` against `history`.
pub fn vet(workflow: &str, olive_tags: &TagSet, history: &History) -> Vetting {
    let vetting = match history {
        History::Frozen(pinned) => Vetting {
            tags: pinned.iter().cloned().collect(),
            changed: false,
            source: VetSource::Frozen,
        },
        History::Controlled(recorded) => {
            let tags = union(olive_tags, recorded.iter());
            let changed = !tags.iter().eq(recorded.iter());
            Vetting {
                tags,
                changed,
                source: VetSource::Controlled,
            }
        }
        History::Prior(reported) => {
            let tags = union(olive_tags, reported.iter());
            let changed = &tags != reported;
            Vetting {
                tags,
                changed,
                source: VetSource::Prior,
            }
        }
        History::Unrecorded => Vetting {
            tags: olive_tags.clone(),
            changed: false,
            source: VetSource::Olive,
        },
    };
    debug!(
        workflow,
        source = ?vetting.source,
        changed = vetting.changed,
        tags = ?vetting.tags,
        "vetted workflow versions"
    );
    vetting
}

fn union<'a>(olive_tags: &'a TagSet, recorded: impl Iterator<Item = &'a String>) -> TagSet {
    olive_tags.iter().chain(recorded).cloned().collect()
}
