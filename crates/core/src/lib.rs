//! Focal core types: entities, roles, filter/sort criteria, snapshots.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod columns;
mod entities;

pub use entities::{
    AccountStatus, Booking, BookingPatch, BookingSortField, BookingStatus, ContentItem,
    ContentKind, ContentPatch, ContentSortField, Transaction, TransactionPatch,
    TransactionSortField, TxnStatus, User, UserPatch, UserSortField, Visibility,
};

/// Numeric entity identifier. Unique within one collection at any point in time.
pub type EntityId = u64;

/// Sentinel categorical filter value meaning "no constraint".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Booking,
    Transaction,
    Content,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Booking => "booking",
            EntityKind::Transaction => "transaction",
            EntityKind::Content => "content",
        }
    }
}

// ---- roles ----

/// Marketplace persona. Variant order is the priority order used when
/// collapsing a role set into a primary role: Admin outranks Moderator,
/// Moderator outranks Photographer, and so on down to User.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    Photographer,
    VenueOwner,
    User,
}

impl Role {
    /// Canonical display casing; also the exact string categorical filters
    /// compare against.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::Photographer => "Photographer",
            Role::VenueOwner => "Venue Owner",
            Role::User => "User",
        }
    }

    /// Case-insensitive parse accepting compact spellings ("venue_owner",
    /// "VenueOwner", "venue owner").
    pub fn parse(raw: &str) -> Option<Role> {
        let norm: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "admin" => Some(Role::Admin),
            "moderator" | "mod" => Some(Role::Moderator),
            "photographer" => Some(Role::Photographer),
            "venueowner" | "venue" => Some(Role::VenueOwner),
            "user" | "client" => Some(Role::User),
            _ => None,
        }
    }

    /// Priority rank, 0 = highest (Admin).
    pub fn rank(&self) -> i64 {
        *self as i64
    }
}

/// Collapse whatever set of raw role markers an entity carries into the single
/// highest-priority role. Empty sets collapse to `Role::User`.
pub fn primary_role(roles: &[Role]) -> Role {
    roles.iter().copied().min().unwrap_or(Role::User)
}

// ---- criteria ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self { field, direction: SortDirection::Asc }
    }

    pub fn desc(field: F) -> Self {
        Self { field, direction: SortDirection::Desc }
    }
}

/// Comparison key selected per entity for one sort field. Text keys compare
/// lexicographically (entities pre-lowercase them), numeric keys numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Num(i64),
}

/// Filter criteria for one list view: a free-text needle plus zero or more
/// categorical constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Matched case-insensitively as a substring of any designated haystack
    /// field; empty means no text constraint.
    pub query: String,
    /// `(dimension, value)` pairs composed conjunctively. A value equal to
    /// [`ALL`] leaves that dimension unconstrained.
    pub categories: Vec<(String, String)>,
}

impl Filters {
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.query = q.into();
        self
    }

    pub fn with_category(mut self, dim: impl Into<String>, value: impl Into<String>) -> Self {
        self.categories.push((dim.into(), value.into()));
        self
    }

    /// True when no entity can be excluded by these criteria.
    pub fn is_identity(&self) -> bool {
        self.query.is_empty() && self.categories.iter().all(|(_, v)| v == ALL)
    }
}

// ---- snapshots ----

/// Immutable view of one collection at a point in time. Mutating store
/// operations publish a fresh snapshot; a snapshot is never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub epoch: u64,
    pub items: Vec<T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self { epoch: 0, items: Vec::new() }
    }
}

// ---- entity seam ----

/// Row-level record managed by a list view.
pub trait Entity: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Per-kind sort field selector.
    type SortField: Copy + std::fmt::Debug + Send + Sync + 'static;
    /// Partial-update record merged by [`Entity::apply_patch`].
    type Patch: Clone + std::fmt::Debug + Send + Sync + 'static;

    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Merge the patch's present fields into the entity.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Designated free-text search fields.
    fn haystacks(&self) -> SmallVec<[&str; 4]>;

    /// Rendered value for a categorical dimension, or `None` when the entity
    /// has no such dimension.
    fn category(&self, dimension: &str) -> Option<String>;

    /// Canonical form of a raw categorical value for a known dimension.
    /// `None` means the dimension itself is unknown to this kind. An
    /// unparseable value for a known dimension passes through unchanged so
    /// exact matching yields an empty result instead of an error.
    fn canonical_category(dimension: &str, raw: &str) -> Option<String>;

    /// Comparison key for the given sort field; `None` when the underlying
    /// value is absent. Missing keys order after present ones in both
    /// directions.
    fn sort_key(&self, field: Self::SortField) -> Option<SortKey>;
}

/// Entities carrying a two-valued status the console can flip.
pub trait ToggleStatus: Entity {
    fn is_active(&self) -> bool;
    /// Patch that flips the status to its opposite value.
    fn toggle_patch(&self) -> Self::Patch;
}

pub mod prelude {
    pub use super::{
        primary_role, Entity, EntityId, EntityKind, Filters, Role, Snapshot, Sort, SortDirection,
        SortKey, ToggleStatus, ALL,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_priority_collapses_to_highest() {
        assert_eq!(primary_role(&[Role::User, Role::Photographer]), Role::Photographer);
        assert_eq!(primary_role(&[Role::Moderator, Role::Admin, Role::User]), Role::Admin);
        assert_eq!(primary_role(&[Role::VenueOwner, Role::Photographer]), Role::Photographer);
        assert_eq!(primary_role(&[]), Role::User);
    }

    #[test]
    fn role_parse_normalizes_casing() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("venue_owner"), Some(Role::VenueOwner));
        assert_eq!(Role::parse("Venue Owner"), Some(Role::VenueOwner));
        assert_eq!(Role::parse("photographer"), Some(Role::Photographer));
        assert_eq!(Role::parse("robot"), None);
    }

    #[test]
    fn identity_filter_detection() {
        assert!(Filters::default().is_identity());
        assert!(Filters::default().with_category("status", ALL).is_identity());
        assert!(!Filters::default().with_query("ann").is_identity());
        assert!(!Filters::default().with_category("status", "Active").is_identity());
    }
}
