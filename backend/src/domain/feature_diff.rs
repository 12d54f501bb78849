//! Reconciliation of a submitted feature list against persisted rows.
//!
//! Classification rules:
//! - an entity without an id, or with id `0`, is always *added*;
//! - an entity whose id matches a persisted row survives, and is *updated*
//!   when its content differs structurally from the stored content;
//! - an entity whose id matches nothing is ignored (stale client id);
//! - every persisted id that no submitted entity matched is *deleted*.
//!
//! Every persisted id therefore ends up either kept or deleted, and every
//! submitted entity is at most one of added or updated.

use std::fmt::Debug;

use tracing::debug;

/// An entity that can take part in a diff: it may carry an id and exposes
/// the content compared for changes.
pub trait Reconcilable {
    /// Identifier type shared by drafts and persisted rows.
    type Id: Copy + Eq + Debug + Into<i64>;
    /// Content compared structurally; ids and ownership are excluded.
    type Content: PartialEq;

    /// Identifier, when the entity has one.
    fn entity_id(&self) -> Option<Self::Id>;

    /// Content compared against the stored row.
    fn content(&self) -> &Self::Content;
}

/// Outcome of [`diff`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDiff<N, I> {
    /// Entities to create.
    pub added: Vec<N>,
    /// Entities whose stored content must be replaced.
    pub updated: Vec<N>,
    /// Persisted ids absent from the submitted snapshot.
    pub deleted_ids: Vec<I>,
}

impl<N, I> FeatureDiff<N, I> {
    /// `true` when nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted_ids.is_empty()
    }
}

/// Classify `submitted` entities against `existing` rows.
///
/// # Examples
/// ```
/// use envsync::domain::{Geometry, ZoneContent, ZoneDraft, diff};
///
/// let draft = ZoneDraft {
///     id: None,
///     content: ZoneContent {
///         name: Some("Hall".to_owned()),
///         description: None,
///         geometry: Geometry::Point([0.0, 0.0]),
///         type_id: None,
///     },
/// };
/// let outcome = diff(vec![draft], &[] as &[envsync::domain::Zone]);
/// assert_eq!(outcome.added.len(), 1);
/// ```
pub fn diff<N, E>(submitted: Vec<N>, existing: &[E]) -> FeatureDiff<N, N::Id>
where
    N: Reconcilable,
    E: Reconcilable<Id = N::Id, Content = N::Content>,
{
    let mut deleted_ids: Vec<N::Id> = existing
        .iter()
        .filter_map(Reconcilable::entity_id)
        .filter(|id| is_assigned(*id))
        .collect();
    let mut added = Vec::new();
    let mut updated = Vec::new();

    for entity in submitted {
        let Some(id) = entity.entity_id().filter(|id| is_assigned(*id)) else {
            added.push(entity);
            continue;
        };

        let Some(stored) = existing
            .iter()
            .find(|candidate| candidate.entity_id() == Some(id))
        else {
            debug!(id = ?id, "submitted id matches no stored row; ignoring");
            continue;
        };

        deleted_ids.retain(|candidate| *candidate != id);
        if stored.content() != entity.content() {
            updated.push(entity);
        }
    }

    debug!(
        added = added.len(),
        updated = updated.len(),
        deleted = deleted_ids.len(),
        "feature diff computed"
    );
    FeatureDiff {
        added,
        updated,
        deleted_ids,
    }
}

fn is_assigned<I: Into<i64>>(id: I) -> bool {
    id.into() != 0
}

#[cfg(test)]
#[path = "feature_diff_tests.rs"]
mod tests;
