//! Built-in display columns for the console's tabular views.
//!
//! One column set per entity kind plus the cell projection that turns a record
//! into rendered strings. The frontends only line these up; widths are
//! character counts for the human output mode.

#![forbid(unsafe_code)]

use crate::{Booking, ContentItem, EntityKind, Transaction, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub label: &'static str,
    pub width: usize,
}

const fn col(label: &'static str, width: usize) -> ColumnSpec {
    ColumnSpec { label, width }
}

const USER_COLUMNS: &[ColumnSpec] = &[
    col("ID", 6),
    col("Name", 22),
    col("Username", 14),
    col("Email", 26),
    col("Role", 13),
    col("Status", 9),
    col("Joined", 11),
];

const BOOKING_COLUMNS: &[ColumnSpec] = &[
    col("ID", 6),
    col("Ref", 9),
    col("Client", 20),
    col("Photographer", 20),
    col("Venue", 18),
    col("Status", 10),
    col("Amount", 10),
    col("Scheduled", 11),
];

const TRANSACTION_COLUMNS: &[ColumnSpec] = &[
    col("ID", 6),
    col("Booking", 8),
    col("Payer", 22),
    col("Status", 9),
    col("Amount", 10),
    col("Created", 11),
];

const CONTENT_COLUMNS: &[ColumnSpec] = &[
    col("ID", 6),
    col("Title", 28),
    col("Author", 18),
    col("Kind", 8),
    col("Visibility", 11),
    col("Flags", 6),
    col("Created", 11),
];

pub fn columns_for(kind: EntityKind) -> &'static [ColumnSpec] {
    match kind {
        EntityKind::User => USER_COLUMNS,
        EntityKind::Booking => BOOKING_COLUMNS,
        EntityKind::Transaction => TRANSACTION_COLUMNS,
        EntityKind::Content => CONTENT_COLUMNS,
    }
}

pub fn user_cells(u: &User) -> Vec<String> {
    vec![
        u.id.to_string(),
        u.name.clone(),
        u.username.clone(),
        u.email.clone(),
        u.primary_role().as_str().to_string(),
        u.status.as_str().to_string(),
        format_date(u.created_ts),
    ]
}

pub fn booking_cells(b: &Booking) -> Vec<String> {
    vec![
        b.id.to_string(),
        b.reference.clone(),
        b.client.clone(),
        b.photographer.clone(),
        b.venue.clone().unwrap_or_else(|| "-".to_string()),
        b.status.as_str().to_string(),
        format_amount(b.amount_cents),
        b.scheduled_ts.map(format_date).unwrap_or_else(|| "-".to_string()),
    ]
}

pub fn transaction_cells(t: &Transaction) -> Vec<String> {
    vec![
        t.id.to_string(),
        t.booking_id.to_string(),
        t.payer.clone(),
        t.status.as_str().to_string(),
        format_amount(t.amount_cents),
        format_date(t.created_ts),
    ]
}

pub fn content_cells(c: &ContentItem) -> Vec<String> {
    vec![
        c.id.to_string(),
        c.title.clone(),
        c.author.clone(),
        c.kind.as_str().to_string(),
        c.visibility.as_str().to_string(),
        c.flags.to_string(),
        format_date(c.created_ts),
    ]
}

/// Cents to a dollar string; refund rows carry negative amounts.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Epoch-millis timestamp to a date cell; out-of-range values render "-".
pub fn format_date(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}
