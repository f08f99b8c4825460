//! The four record kinds managed by the console, with their patch types.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::{primary_role, Entity, EntityId, EntityKind, Role, SortKey, ToggleStatus};

// ---- users ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Inactive,
            AccountStatus::Inactive => AccountStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub roles: SmallVec<[Role; 4]>,
    pub status: AccountStatus,
    /// Signup time, epoch milliseconds.
    pub created_ts: i64,
}

impl User {
    pub fn primary_role(&self) -> Role {
        primary_role(&self.roles)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<AccountStatus>,
    pub roles: Option<SmallVec<[Role; 4]>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Username,
    Email,
    Role,
    Status,
    Created,
}

impl Entity for User {
    type SortField = UserSortField;
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(v) = &patch.username {
            self.username = v.clone();
        }
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.email {
            self.email = v.clone();
        }
        if let Some(v) = &patch.phone {
            self.phone = Some(v.clone());
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = &patch.roles {
            self.roles = v.clone();
        }
    }

    fn haystacks(&self) -> SmallVec<[&str; 4]> {
        smallvec![self.name.as_str(), self.email.as_str(), self.username.as_str()]
    }

    fn category(&self, dimension: &str) -> Option<String> {
        match dimension {
            "role" => Some(self.primary_role().as_str().to_string()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn canonical_category(dimension: &str, raw: &str) -> Option<String> {
        match dimension {
            "role" => Some(
                Role::parse(raw).map(|r| r.as_str().to_string()).unwrap_or_else(|| raw.to_string()),
            ),
            "status" => Some(
                AccountStatus::parse(raw)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
            _ => None,
        }
    }

    fn sort_key(&self, field: UserSortField) -> Option<SortKey> {
        match field {
            UserSortField::Name => Some(SortKey::Text(self.name.to_lowercase())),
            UserSortField::Username => Some(SortKey::Text(self.username.to_lowercase())),
            UserSortField::Email => Some(SortKey::Text(self.email.to_lowercase())),
            UserSortField::Role => Some(SortKey::Num(self.primary_role().rank())),
            UserSortField::Status => Some(SortKey::Text(self.status.as_str().to_lowercase())),
            UserSortField::Created => Some(SortKey::Num(self.created_ts)),
        }
    }
}

impl ToggleStatus for User {
    fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    fn toggle_patch(&self) -> UserPatch {
        UserPatch { status: Some(self.status.toggled()), ..UserPatch::default() }
    }
}

// ---- bookings ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: EntityId,
    /// Human-facing booking code, e.g. "BK-2041".
    pub reference: String,
    pub client: String,
    pub photographer: String,
    #[serde(default)]
    pub venue: Option<String>,
    pub status: BookingStatus,
    pub amount_cents: i64,
    /// Shoot time, epoch milliseconds; absent until the client picks a slot.
    #[serde(default)]
    pub scheduled_ts: Option<i64>,
    pub created_ts: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub venue: Option<String>,
    pub scheduled_ts: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingSortField {
    Reference,
    Client,
    Photographer,
    Venue,
    Status,
    Amount,
    Scheduled,
    Created,
}

impl Entity for Booking {
    type SortField = BookingSortField;
    type Patch = BookingPatch;

    const KIND: EntityKind = EntityKind::Booking;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &BookingPatch) {
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = &patch.venue {
            self.venue = Some(v.clone());
        }
        if let Some(v) = patch.scheduled_ts {
            self.scheduled_ts = Some(v);
        }
    }

    fn haystacks(&self) -> SmallVec<[&str; 4]> {
        smallvec![self.client.as_str(), self.photographer.as_str(), self.reference.as_str()]
    }

    fn category(&self, dimension: &str) -> Option<String> {
        match dimension {
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn canonical_category(dimension: &str, raw: &str) -> Option<String> {
        match dimension {
            "status" => Some(
                BookingStatus::parse(raw)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
            _ => None,
        }
    }

    fn sort_key(&self, field: BookingSortField) -> Option<SortKey> {
        match field {
            BookingSortField::Reference => Some(SortKey::Text(self.reference.to_lowercase())),
            BookingSortField::Client => Some(SortKey::Text(self.client.to_lowercase())),
            BookingSortField::Photographer => {
                Some(SortKey::Text(self.photographer.to_lowercase()))
            }
            BookingSortField::Venue => {
                self.venue.as_ref().map(|v| SortKey::Text(v.to_lowercase()))
            }
            BookingSortField::Status => Some(SortKey::Text(self.status.as_str().to_lowercase())),
            BookingSortField::Amount => Some(SortKey::Num(self.amount_cents)),
            BookingSortField::Scheduled => self.scheduled_ts.map(SortKey::Num),
            BookingSortField::Created => Some(SortKey::Num(self.created_ts)),
        }
    }
}

// ---- transactions ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnStatus {
    Paid,
    Pending,
    Refunded,
    Failed,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Paid => "Paid",
            TxnStatus::Pending => "Pending",
            TxnStatus::Refunded => "Refunded",
            TxnStatus::Failed => "Failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "paid" => Some(TxnStatus::Paid),
            "pending" => Some(TxnStatus::Pending),
            "refunded" => Some(TxnStatus::Refunded),
            "failed" => Some(TxnStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    pub booking_id: EntityId,
    pub payer: String,
    pub status: TxnStatus,
    pub amount_cents: i64,
    pub created_ts: i64,
}

/// Transactions are read-only in the console today; the patch exists so the
/// kind participates in the generic store/dispatcher contract (marking a
/// refund is the one admissible mutation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub status: Option<TxnStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSortField {
    Payer,
    Status,
    Amount,
    Created,
}

impl Entity for Transaction {
    type SortField = TransactionSortField;
    type Patch = TransactionPatch;

    const KIND: EntityKind = EntityKind::Transaction;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &TransactionPatch) {
        if let Some(v) = patch.status {
            self.status = v;
        }
    }

    fn haystacks(&self) -> SmallVec<[&str; 4]> {
        smallvec![self.payer.as_str()]
    }

    fn category(&self, dimension: &str) -> Option<String> {
        match dimension {
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn canonical_category(dimension: &str, raw: &str) -> Option<String> {
        match dimension {
            "status" => Some(
                TxnStatus::parse(raw)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
            _ => None,
        }
    }

    fn sort_key(&self, field: TransactionSortField) -> Option<SortKey> {
        match field {
            TransactionSortField::Payer => Some(SortKey::Text(self.payer.to_lowercase())),
            TransactionSortField::Status => {
                Some(SortKey::Text(self.status.as_str().to_lowercase()))
            }
            TransactionSortField::Amount => Some(SortKey::Num(self.amount_cents)),
            TransactionSortField::Created => Some(SortKey::Num(self.created_ts)),
        }
    }
}

// ---- content ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Photo,
    Review,
    Comment,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Photo => "Photo",
            ContentKind::Review => "Review",
            ContentKind::Comment => "Comment",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "photo" => Some(ContentKind::Photo),
            "review" => Some(ContentKind::Review),
            "comment" => Some(ContentKind::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "Visible",
            Visibility::Hidden => "Hidden",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "visible" => Some(Visibility::Visible),
            "hidden" => Some(Visibility::Hidden),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Visibility::Visible => Visibility::Hidden,
            Visibility::Hidden => Visibility::Visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: EntityId,
    pub title: String,
    pub author: String,
    pub kind: ContentKind,
    pub visibility: Visibility,
    /// Number of open user reports against this item.
    #[serde(default)]
    pub flags: u32,
    pub created_ts: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub flags: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSortField {
    Title,
    Author,
    Kind,
    Flags,
    Created,
}

impl Entity for ContentItem {
    type SortField = ContentSortField;
    type Patch = ContentPatch;

    const KIND: EntityKind = EntityKind::Content;

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &ContentPatch) {
        if let Some(v) = &patch.title {
            self.title = v.clone();
        }
        if let Some(v) = patch.visibility {
            self.visibility = v;
        }
        if let Some(v) = patch.flags {
            self.flags = v;
        }
    }

    fn haystacks(&self) -> SmallVec<[&str; 4]> {
        smallvec![self.title.as_str(), self.author.as_str()]
    }

    fn category(&self, dimension: &str) -> Option<String> {
        match dimension {
            "status" => Some(self.visibility.as_str().to_string()),
            "kind" => Some(self.kind.as_str().to_string()),
            _ => None,
        }
    }

    fn canonical_category(dimension: &str, raw: &str) -> Option<String> {
        match dimension {
            "status" => Some(
                Visibility::parse(raw)
                    .map(|v| v.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
            "kind" => Some(
                ContentKind::parse(raw)
                    .map(|k| k.as_str().to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
            _ => None,
        }
    }

    fn sort_key(&self, field: ContentSortField) -> Option<SortKey> {
        match field {
            ContentSortField::Title => Some(SortKey::Text(self.title.to_lowercase())),
            ContentSortField::Author => Some(SortKey::Text(self.author.to_lowercase())),
            ContentSortField::Kind => Some(SortKey::Text(self.kind.as_str().to_lowercase())),
            ContentSortField::Flags => Some(SortKey::Num(self.flags as i64)),
            ContentSortField::Created => Some(SortKey::Num(self.created_ts)),
        }
    }
}

impl ToggleStatus for ContentItem {
    fn is_active(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    fn toggle_patch(&self) -> ContentPatch {
        ContentPatch { visibility: Some(self.visibility.toggled()), ..ContentPatch::default() }
    }
}
