#![forbid(unsafe_code)]

use focal_core::{
    AccountStatus, Booking, BookingSortField, BookingStatus, Filters, Role, Sort, User,
    UserPatch, UserSortField, ALL,
};
use focal_search::{derive_view, derive_view_with_debug, parse_query};
use focal_store::ListStore;
use smallvec::smallvec;

fn user(id: u64, name: &str, status: AccountStatus) -> User {
    User {
        id,
        username: format!("u{}", id),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        roles: smallvec![Role::User],
        status,
        created_ts: 1_700_000_000_000 + id as i64,
    }
}

fn booking(id: u64, client: &str, venue: Option<&str>) -> Booking {
    Booking {
        id,
        reference: format!("BK-{}", id),
        client: client.to_string(),
        photographer: "P".to_string(),
        venue: venue.map(|v| v.to_string()),
        status: BookingStatus::Pending,
        amount_cents: 10_000,
        scheduled_ts: None,
        created_ts: id as i64,
    }
}

fn ids(users: &[User]) -> Vec<u64> {
    users.iter().map(|u| u.id).collect()
}

#[test]
fn case_insensitive_substring_with_stable_ties() {
    // "Anna" and "anna" compare equal under the lowercased name key; stable
    // sort keeps input order 1 before 3.
    let coll = vec![
        user(1, "Anna", AccountStatus::Active),
        user(2, "Bob", AccountStatus::Inactive),
        user(3, "anna", AccountStatus::Active),
    ];
    let filters = Filters::default().with_query("ann");
    let out = derive_view(&coll, &filters, &Sort::asc(UserSortField::Name));
    assert_eq!(ids(&out), vec![1, 3]);
}

#[test]
fn ties_keep_input_order_in_both_directions() {
    let coll = vec![
        user(1, "Anna", AccountStatus::Active),
        user(2, "Bob", AccountStatus::Inactive),
        user(3, "anna", AccountStatus::Active),
    ];
    let desc = derive_view(&coll, &Filters::default(), &Sort::desc(UserSortField::Name));
    assert_eq!(ids(&desc), vec![2, 1, 3], "equal keys keep 1 before 3 even descending");
}

#[test]
fn identity_filter_keeps_everything() {
    let coll: Vec<User> = (1..=5).map(|i| user(i, &format!("User{}", i), AccountStatus::Active)).collect();
    let filters = Filters::default().with_category("status", ALL);
    let (out, dbg) = derive_view_with_debug(&coll, &filters, &Sort::asc(UserSortField::Created));
    assert_eq!(out.len(), coll.len());
    assert_eq!(dbg.total, 5);
    assert_eq!(dbg.after_query, 5);
    assert_eq!(dbg.after_categories, 5);
}

#[test]
fn filtered_view_is_a_subset_with_no_duplicates() {
    let coll = vec![
        user(1, "Anna", AccountStatus::Active),
        user(2, "Annabel", AccountStatus::Inactive),
        user(3, "Bob", AccountStatus::Active),
        user(4, "Hannah", AccountStatus::Active),
    ];
    let filters = Filters::default().with_query("ann").with_category("status", "Active");
    let out = derive_view(&coll, &filters, &Sort::asc(UserSortField::Name));

    // exactly the matching subset: substring OR across haystacks AND status
    assert_eq!(ids(&out), vec![1, 4]);
    assert!(out.len() <= coll.len());
    let mut seen = std::collections::HashSet::new();
    assert!(out.iter().all(|u| seen.insert(u.id)), "no duplicated entity");
}

#[test]
fn direction_toggle_reverses_exactly_without_ties() {
    let coll = vec![
        user(1, "Cleo", AccountStatus::Active),
        user(2, "Anna", AccountStatus::Active),
        user(3, "Bob", AccountStatus::Active),
        user(4, "Dara", AccountStatus::Active),
    ];
    let asc = derive_view(&coll, &Filters::default(), &Sort::asc(UserSortField::Name));
    let desc = derive_view(&coll, &Filters::default(), &Sort::desc(UserSortField::Name));
    let mut reversed = ids(&asc);
    reversed.reverse();
    assert_eq!(ids(&desc), reversed);
}

#[test]
fn missing_sort_keys_order_last_in_both_directions() {
    let coll = vec![
        booking(1, "c1", None),
        booking(2, "c2", Some("Marsh Hall")),
        booking(3, "c3", Some("Annex")),
        booking(4, "c4", None),
    ];
    let asc = derive_view(&coll, &Filters::default(), &Sort::asc(BookingSortField::Venue));
    let asc_ids: Vec<u64> = asc.iter().map(|b| b.id).collect();
    assert_eq!(asc_ids, vec![3, 2, 1, 4], "venueless rows trail, keeping input order");

    let desc = derive_view(&coll, &Filters::default(), &Sort::desc(BookingSortField::Venue));
    let desc_ids: Vec<u64> = desc.iter().map(|b| b.id).collect();
    assert_eq!(desc_ids, vec![2, 3, 1, 4], "still trailing when descending");
}

#[test]
fn role_filter_compares_canonical_casing() {
    let mut photographer = user(1, "Anna", AccountStatus::Active);
    photographer.roles = smallvec![Role::Photographer, Role::User];
    let coll = vec![photographer, user(2, "Bob", AccountStatus::Active)];

    let filters = parse_query::<User>("role:PHOTOGRAPHER");
    let out = derive_view(&coll, &filters, &Sort::asc(UserSortField::Name));
    assert_eq!(ids(&out), vec![1]);
}

#[test]
fn role_sort_orders_by_priority_not_alphabet() {
    let mut admin = user(1, "Zed", AccountStatus::Active);
    admin.roles = smallvec![Role::Admin];
    let mut venue = user(2, "Abe", AccountStatus::Active);
    venue.roles = smallvec![Role::VenueOwner];
    let mut plain = user(3, "Mia", AccountStatus::Active);
    plain.roles = smallvec![Role::User];
    let coll = vec![plain, venue, admin];

    let out = derive_view(&coll, &Filters::default(), &Sort::asc(UserSortField::Role));
    assert_eq!(ids(&out), vec![1, 2, 3], "Admin before Venue Owner before User");
}

#[test]
fn empty_collection_yields_empty_view() {
    let coll: Vec<User> = Vec::new();
    let out = derive_view(&coll, &Filters::default().with_query("x"), &Sort::asc(UserSortField::Name));
    assert!(out.is_empty());
}

#[test]
fn store_patch_flows_into_the_derived_view() {
    let store = ListStore::new();
    store.replace_all(vec![
        user(1, "Anna", AccountStatus::Active),
        user(2, "Bob", AccountStatus::Inactive),
    ]);

    // flip Bob to Active, then re-derive with the Active filter
    store.patch(2, &UserPatch { status: Some(AccountStatus::Active), ..Default::default() });
    let snap = store.current();
    let filters = Filters::default().with_category("status", "Active");
    let out = derive_view(&snap.items, &filters, &Sort::asc(UserSortField::Name));
    assert_eq!(ids(&out), vec![1, 2]);
}

#[test]
fn store_remove_never_reappears_in_the_view() {
    let store = ListStore::new();
    store.replace_all(vec![
        user(1, "Anna", AccountStatus::Active),
        user(2, "Bob", AccountStatus::Active),
        user(3, "Cleo", AccountStatus::Active),
    ]);
    let before = store.current().items.len();
    store.remove(2);
    let snap = store.current();
    assert_eq!(snap.items.len(), before - 1);

    let out = derive_view(&snap.items, &Filters::default(), &Sort::asc(UserSortField::Name));
    assert!(out.iter().all(|u| u.id != 2));
}
