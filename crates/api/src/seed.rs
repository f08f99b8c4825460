//! Built-in fixture dataset.
//!
//! Stands in for the marketplace API in demos and tests. Ids are stable;
//! tests and walkthroughs address records by them.

use focal_core::{
    AccountStatus, Booking, BookingStatus, ContentItem, ContentKind, Role, Transaction, TxnStatus,
    User, Visibility,
};

use crate::Dataset;

fn user(
    id: u64,
    username: &str,
    name: &str,
    email: &str,
    phone: Option<&str>,
    roles: &[Role],
    status: AccountStatus,
    created_ts: i64,
) -> User {
    User {
        id,
        username: username.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(|p| p.to_string()),
        roles: roles.iter().copied().collect(),
        status,
        created_ts,
    }
}

pub(crate) fn dataset() -> Dataset {
    let users = vec![
        user(
            1,
            "mvance",
            "Mira Vance",
            "mira@focal.studio",
            Some("+1 415 555 0134"),
            &[Role::Admin, Role::User],
            AccountStatus::Active,
            1_672_531_200_000, // 2023-01-01
        ),
        user(
            2,
            "jokafor",
            "Jon Okafor",
            "jon.okafor@focal.studio",
            Some("+44 20 7946 0812"),
            &[Role::Moderator],
            AccountStatus::Active,
            1_680_307_200_000, // 2023-04-01
        ),
        user(
            3,
            "annaq",
            "Anna Quirke",
            "anna.q@lenswork.io",
            Some("+353 1 555 2210"),
            &[Role::Photographer, Role::User],
            AccountStatus::Active,
            1_688_169_600_000, // 2023-07-01
        ),
        user(
            4,
            "dmarsh",
            "Dee Marsh",
            "dee@marshvenues.com",
            None,
            &[Role::VenueOwner],
            AccountStatus::Active,
            1_693_526_400_000, // 2023-09-01
        ),
        user(
            5,
            "tkato",
            "Taro Kato",
            "taro.kato@lenswork.io",
            Some("+81 3 5555 8890"),
            &[Role::Photographer],
            AccountStatus::Inactive,
            1_701_388_800_000, // 2023-12-01
        ),
        user(
            6,
            "lruiz",
            "Lena Ruiz",
            "lena.ruiz@gmail.com",
            None,
            &[Role::User],
            AccountStatus::Active,
            1_706_745_600_000, // 2024-02-01
        ),
        user(
            7,
            "pbyrne",
            "Padraig Byrne",
            "p.byrne@shotlist.ie",
            Some("+353 87 555 4411"),
            &[Role::Photographer, Role::VenueOwner],
            AccountStatus::Active,
            1_711_929_600_000, // 2024-04-01
        ),
        user(
            8,
            "scole",
            "Sasha Cole",
            "sasha.cole@gmail.com",
            None,
            &[Role::User],
            AccountStatus::Inactive,
            1_717_200_000_000, // 2024-06-01
        ),
    ];

    let bookings = vec![
        Booking {
            id: 101,
            reference: "BK-2041".into(),
            client: "Lena Ruiz".into(),
            photographer: "Anna Quirke".into(),
            venue: Some("Marsh Hall".into()),
            status: BookingStatus::Confirmed,
            amount_cents: 45_000,
            scheduled_ts: Some(1_726_300_800_000),
            created_ts: 1_721_001_600_000,
        },
        Booking {
            id: 102,
            reference: "BK-2042".into(),
            client: "Sasha Cole".into(),
            photographer: "Taro Kato".into(),
            venue: None,
            status: BookingStatus::Pending,
            amount_cents: 28_000,
            scheduled_ts: None,
            created_ts: 1_721_606_400_000,
        },
        Booking {
            id: 103,
            reference: "BK-2043".into(),
            client: "Lena Ruiz".into(),
            photographer: "Padraig Byrne".into(),
            venue: Some("Dockside Loft".into()),
            status: BookingStatus::Completed,
            amount_cents: 62_500,
            scheduled_ts: Some(1_722_816_000_000),
            created_ts: 1_719_792_000_000,
        },
        Booking {
            id: 104,
            reference: "BK-2044".into(),
            client: "Omar Haddad".into(),
            photographer: "Anna Quirke".into(),
            venue: Some("Marsh Hall".into()),
            status: BookingStatus::Cancelled,
            amount_cents: 38_000,
            scheduled_ts: Some(1_723_420_800_000),
            created_ts: 1_720_396_800_000,
        },
        Booking {
            id: 105,
            reference: "BK-2045".into(),
            client: "Priya Nair".into(),
            photographer: "Padraig Byrne".into(),
            venue: None,
            status: BookingStatus::Confirmed,
            amount_cents: 51_000,
            scheduled_ts: Some(1_727_510_400_000),
            created_ts: 1_722_211_200_000,
        },
        Booking {
            id: 106,
            reference: "BK-2046".into(),
            client: "Omar Haddad".into(),
            photographer: "Taro Kato".into(),
            venue: Some("Pier 9 Studio".into()),
            status: BookingStatus::Pending,
            amount_cents: 19_500,
            scheduled_ts: None,
            created_ts: 1_722_816_000_000,
        },
    ];

    let transactions = vec![
        Transaction {
            id: 501,
            booking_id: 101,
            payer: "Lena Ruiz".into(),
            status: TxnStatus::Paid,
            amount_cents: 45_000,
            created_ts: 1_721_088_000_000,
        },
        Transaction {
            id: 502,
            booking_id: 103,
            payer: "Lena Ruiz".into(),
            status: TxnStatus::Paid,
            amount_cents: 62_500,
            created_ts: 1_719_878_400_000,
        },
        Transaction {
            id: 503,
            booking_id: 104,
            payer: "Omar Haddad".into(),
            status: TxnStatus::Refunded,
            amount_cents: -38_000,
            created_ts: 1_720_483_200_000,
        },
        Transaction {
            id: 504,
            booking_id: 105,
            payer: "Priya Nair".into(),
            status: TxnStatus::Pending,
            amount_cents: 51_000,
            created_ts: 1_722_297_600_000,
        },
        Transaction {
            id: 505,
            booking_id: 102,
            payer: "Sasha Cole".into(),
            status: TxnStatus::Failed,
            amount_cents: 28_000,
            created_ts: 1_721_692_800_000,
        },
        Transaction {
            id: 506,
            booking_id: 106,
            payer: "Omar Haddad".into(),
            status: TxnStatus::Pending,
            amount_cents: 19_500,
            created_ts: 1_722_902_400_000,
        },
    ];

    let content = vec![
        ContentItem {
            id: 901,
            title: "Golden hour at Marsh Hall".into(),
            author: "Anna Quirke".into(),
            kind: ContentKind::Photo,
            visibility: Visibility::Visible,
            flags: 0,
            created_ts: 1_722_902_400_000,
        },
        ContentItem {
            id: 902,
            title: "Great communication, stunning shots".into(),
            author: "Lena Ruiz".into(),
            kind: ContentKind::Review,
            visibility: Visibility::Visible,
            flags: 0,
            created_ts: 1_723_507_200_000,
        },
        ContentItem {
            id: 903,
            title: "Dockside Loft preview set".into(),
            author: "Padraig Byrne".into(),
            kind: ContentKind::Photo,
            visibility: Visibility::Visible,
            flags: 1,
            created_ts: 1_723_939_200_000,
        },
        ContentItem {
            id: 904,
            title: "Photographer never showed".into(),
            author: "Omar Haddad".into(),
            kind: ContentKind::Review,
            visibility: Visibility::Hidden,
            flags: 3,
            created_ts: 1_724_112_000_000,
        },
        ContentItem {
            id: 905,
            title: "Re: reschedule policy".into(),
            author: "Sasha Cole".into(),
            kind: ContentKind::Comment,
            visibility: Visibility::Visible,
            flags: 2,
            created_ts: 1_724_371_200_000,
        },
        ContentItem {
            id: 906,
            title: "Pier 9 lighting test".into(),
            author: "Taro Kato".into(),
            kind: ContentKind::Photo,
            visibility: Visibility::Hidden,
            flags: 0,
            created_ts: 1_724_630_400_000,
        },
    ];

    Dataset { users, bookings, transactions, content }
}
