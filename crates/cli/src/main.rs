use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;

use focal_api::{FixtureBackend, Resource};
use focal_core::columns::{self, ColumnSpec};
use focal_core::{
    Booking, BookingPatch, BookingSortField, BookingStatus, ContentItem, ContentSortField,
    Entity, Filters, Snapshot, Sort, SortDirection, Transaction, TransactionSortField, User,
    UserPatch, UserSortField, ALL,
};
use focal_ops::{Dispatcher, LogNotifier, Outcome, ToggleMode, Validate};
use focal_search::{derive_view_with_debug, parse_query, DeriveDebug};
use focal_store::ListStore;

#[derive(Parser, Debug)]
#[command(name = "focalctl", version, about = "Focal marketplace admin console")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Fixture dataset file (JSON); defaults to the built-in seed
    #[arg(long = "fixtures", global = true, env = "FOCAL_FIXTURES")]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage marketplace accounts
    Users {
        #[command(subcommand)]
        cmd: UserCmd,
    },
    /// Manage shoot bookings
    Bookings {
        #[command(subcommand)]
        cmd: BookingCmd,
    },
    /// Inspect payment transactions
    Transactions {
        #[command(subcommand)]
        cmd: TxnCmd,
    },
    /// Moderate user-submitted content
    Content {
        #[command(subcommand)]
        cmd: ContentCmd,
    },
    /// Dashboard summary across all collections
    Stats,
}

#[derive(Subcommand, Debug)]
enum UserCmd {
    /// List accounts; query supports `role:` / `status:` tokens plus free text
    Ls {
        #[arg(default_value = "")]
        query: String,
        #[arg(long = "role")]
        role: Option<String>,
        #[arg(long = "status")]
        status: Option<String>,
        #[arg(long = "sort", value_enum, default_value_t = UserSortArg::Name)]
        sort: UserSortArg,
        /// Sort descending
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        /// Print filter stage counts
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Show one account's detail projection
    Get { id: u64 },
    /// Edit account fields (validated locally before submit)
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Flip the account between Active and Inactive
    Toggle { id: u64 },
    /// Delete an account; requires --confirm DELETE
    Delete {
        id: u64,
        /// Typed confirmation phrase
        #[arg(long = "confirm", default_value = "")]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
enum BookingCmd {
    /// List bookings; query supports `status:` tokens plus free text
    Ls {
        #[arg(default_value = "")]
        query: String,
        #[arg(long = "status")]
        status: Option<String>,
        #[arg(long = "sort", value_enum, default_value_t = BookingSortArg::Created)]
        sort: BookingSortArg,
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Show one booking
    Get { id: u64 },
    /// Edit booking fields
    Edit {
        id: u64,
        /// New status (pending|confirmed|completed|cancelled)
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        venue: Option<String>,
    },
    /// Delete a booking; requires --confirm DELETE
    Delete {
        id: u64,
        #[arg(long = "confirm", default_value = "")]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
enum TxnCmd {
    /// List transactions; query supports `status:` tokens plus free text
    Ls {
        #[arg(default_value = "")]
        query: String,
        #[arg(long = "status")]
        status: Option<String>,
        #[arg(long = "sort", value_enum, default_value_t = TxnSortArg::Created)]
        sort: TxnSortArg,
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Show one transaction
    Get { id: u64 },
}

#[derive(Subcommand, Debug)]
enum ContentCmd {
    /// List content; query supports `status:` / `kind:` tokens plus free text
    Ls {
        #[arg(default_value = "")]
        query: String,
        #[arg(long = "status")]
        status: Option<String>,
        #[arg(long = "kind")]
        kind: Option<String>,
        #[arg(long = "sort", value_enum, default_value_t = ContentSortArg::Created)]
        sort: ContentSortArg,
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Show one content item
    Get { id: u64 },
    /// Flip the item between Visible and Hidden (moderation has no backing
    /// endpoint; this toggle is local-only)
    Toggle { id: u64 },
    /// Delete a content item; requires --confirm DELETE
    Delete {
        id: u64,
        #[arg(long = "confirm", default_value = "")]
        confirm: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum UserSortArg {
    Name,
    Username,
    Email,
    Role,
    Status,
    Created,
}

impl UserSortArg {
    fn field(self) -> UserSortField {
        match self {
            UserSortArg::Name => UserSortField::Name,
            UserSortArg::Username => UserSortField::Username,
            UserSortArg::Email => UserSortField::Email,
            UserSortArg::Role => UserSortField::Role,
            UserSortArg::Status => UserSortField::Status,
            UserSortArg::Created => UserSortField::Created,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum BookingSortArg {
    Reference,
    Client,
    Photographer,
    Venue,
    Status,
    Amount,
    Scheduled,
    Created,
}

impl BookingSortArg {
    fn field(self) -> BookingSortField {
        match self {
            BookingSortArg::Reference => BookingSortField::Reference,
            BookingSortArg::Client => BookingSortField::Client,
            BookingSortArg::Photographer => BookingSortField::Photographer,
            BookingSortArg::Venue => BookingSortField::Venue,
            BookingSortArg::Status => BookingSortField::Status,
            BookingSortArg::Amount => BookingSortField::Amount,
            BookingSortArg::Scheduled => BookingSortField::Scheduled,
            BookingSortArg::Created => BookingSortField::Created,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum TxnSortArg {
    Payer,
    Status,
    Amount,
    Created,
}

impl TxnSortArg {
    fn field(self) -> TransactionSortField {
        match self {
            TxnSortArg::Payer => TransactionSortField::Payer,
            TxnSortArg::Status => TransactionSortField::Status,
            TxnSortArg::Amount => TransactionSortField::Amount,
            TxnSortArg::Created => TransactionSortField::Created,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ContentSortArg {
    Title,
    Author,
    Kind,
    Flags,
    Created,
}

impl ContentSortArg {
    fn field(self) -> ContentSortField {
        match self {
            ContentSortArg::Title => ContentSortField::Title,
            ContentSortArg::Author => ContentSortField::Author,
            ContentSortArg::Kind => ContentSortField::Kind,
            ContentSortArg::Flags => ContentSortField::Flags,
            ContentSortArg::Created => ContentSortField::Created,
        }
    }
}

fn init_tracing() {
    let env = std::env::var("FOCAL_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FOCAL_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid FOCAL_METRICS_ADDR; expected host:port");
        }
    }
}

fn load_backend(path: Option<&Path>) -> Result<FixtureBackend> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("reading fixtures from {}", p.display()))?;
            let backend = FixtureBackend::from_json(&raw).context("parsing fixture JSON")?;
            info!(path = %p.display(), "fixtures loaded");
            Ok(backend)
        }
        None => Ok(FixtureBackend::seeded()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let backend = load_backend(cli.fixtures.as_deref())?;
    let output = cli.output;

    match cli.command {
        Commands::Users { cmd } => match cmd {
            UserCmd::Ls { query, role, status, sort, desc, explain } => {
                let mut filters = parse_query::<User>(&query);
                flag_filter::<User>(&mut filters, "role", role);
                flag_filter::<User>(&mut filters, "status", status);
                let sort = direction(sort.field(), desc);
                run_ls(&backend, filters, sort, explain, output, columns::user_cells).await?;
            }
            UserCmd::Get { id } => {
                run_get(&backend, id, ToggleMode::ServerConfirmed, output, columns::user_cells)
                    .await?;
            }
            UserCmd::Edit { id, name, username, email, phone } => {
                let patch = UserPatch { name, username, email, phone, ..Default::default() };
                if patch == UserPatch::default() {
                    bail!("nothing to edit; pass at least one of --name/--username/--email/--phone");
                }
                run_edit::<User>(&backend, id, patch).await?;
            }
            UserCmd::Toggle { id } => {
                run_toggle::<User>(&backend, id, ToggleMode::ServerConfirmed).await?;
            }
            UserCmd::Delete { id, confirm } => {
                run_delete::<User>(&backend, id, &confirm).await?;
            }
        },
        Commands::Bookings { cmd } => match cmd {
            BookingCmd::Ls { query, status, sort, desc, explain } => {
                let mut filters = parse_query::<Booking>(&query);
                flag_filter::<Booking>(&mut filters, "status", status);
                let sort = direction(sort.field(), desc);
                run_ls(&backend, filters, sort, explain, output, columns::booking_cells).await?;
            }
            BookingCmd::Get { id } => {
                run_get(&backend, id, ToggleMode::ServerConfirmed, output, columns::booking_cells)
                    .await?;
            }
            BookingCmd::Edit { id, status, venue } => {
                let status = match status {
                    Some(raw) => Some(
                        BookingStatus::parse(&raw)
                            .with_context(|| format!("unknown booking status: {}", raw))?,
                    ),
                    None => None,
                };
                let patch = BookingPatch { status, venue, ..Default::default() };
                if patch == BookingPatch::default() {
                    bail!("nothing to edit; pass --status and/or --venue");
                }
                run_edit::<Booking>(&backend, id, patch).await?;
            }
            BookingCmd::Delete { id, confirm } => {
                run_delete::<Booking>(&backend, id, &confirm).await?;
            }
        },
        Commands::Transactions { cmd } => match cmd {
            TxnCmd::Ls { query, status, sort, desc, explain } => {
                let mut filters = parse_query::<Transaction>(&query);
                flag_filter::<Transaction>(&mut filters, "status", status);
                let sort = direction(sort.field(), desc);
                run_ls(&backend, filters, sort, explain, output, columns::transaction_cells)
                    .await?;
            }
            TxnCmd::Get { id } => {
                run_get(
                    &backend,
                    id,
                    ToggleMode::ServerConfirmed,
                    output,
                    columns::transaction_cells,
                )
                .await?;
            }
        },
        Commands::Content { cmd } => match cmd {
            ContentCmd::Ls { query, status, kind, sort, desc, explain } => {
                let mut filters = parse_query::<ContentItem>(&query);
                flag_filter::<ContentItem>(&mut filters, "status", status);
                flag_filter::<ContentItem>(&mut filters, "kind", kind);
                let sort = direction(sort.field(), desc);
                run_ls(&backend, filters, sort, explain, output, columns::content_cells).await?;
            }
            ContentCmd::Get { id } => {
                run_get(&backend, id, ToggleMode::LocalOnly, output, columns::content_cells)
                    .await?;
            }
            ContentCmd::Toggle { id } => {
                run_toggle::<ContentItem>(&backend, id, ToggleMode::LocalOnly).await?;
            }
            ContentCmd::Delete { id, confirm } => {
                run_delete::<ContentItem>(&backend, id, &confirm).await?;
            }
        },
        Commands::Stats => {
            run_stats(&backend, output).await?;
        }
    }

    Ok(())
}

fn direction<F>(field: F, desc: bool) -> Sort<F> {
    Sort { field, direction: if desc { SortDirection::Desc } else { SortDirection::Asc } }
}

/// Canonicalize a `--flag` value and append it as a categorical constraint.
fn flag_filter<T: Entity>(filters: &mut Filters, dim: &str, value: Option<String>) {
    if let Some(raw) = value {
        let canon = if raw.eq_ignore_ascii_case(ALL) {
            ALL.to_string()
        } else {
            T::canonical_category(dim, &raw).unwrap_or(raw)
        };
        filters.categories.push((dim.to_string(), canon));
    }
}

async fn load_view<T>(backend: &FixtureBackend) -> Result<(Arc<ListStore<T>>, Arc<Snapshot<T>>)>
where
    T: Entity,
    FixtureBackend: Resource<T>,
{
    let store = ListStore::new();
    store.load(backend).await?;
    let snap = store.current();
    Ok((store, snap))
}

fn dispatcher_for<T>(
    backend: &FixtureBackend,
    store: &Arc<ListStore<T>>,
    mode: ToggleMode,
) -> Dispatcher<T>
where
    T: Entity,
    FixtureBackend: Resource<T>,
{
    Dispatcher::new(Arc::new(backend.clone()), store, Arc::new(LogNotifier)).with_toggle_mode(mode)
}

async fn run_ls<T, C>(
    backend: &FixtureBackend,
    filters: Filters,
    sort: Sort<T::SortField>,
    explain: bool,
    output: Output,
    cells: C,
) -> Result<()>
where
    T: Entity + serde::Serialize,
    FixtureBackend: Resource<T>,
    C: Fn(&T) -> Vec<String>,
{
    let (_store, snap) = load_view::<T>(backend).await?;
    let (rows, dbg) = derive_view_with_debug(&snap.items, &filters, &sort);

    match output {
        Output::Human => {
            print_table(columns::columns_for(T::KIND), rows.iter().map(&cells));
            if explain {
                print_explain(&dbg);
            }
        }
        Output::Json => {
            if explain {
                #[derive(serde::Serialize)]
                struct Explain<'a, R> {
                    rows: R,
                    debug: &'a DeriveDebug,
                }
                println!("{}", serde_json::to_string_pretty(&Explain { rows: &rows, debug: &dbg })?);
            } else {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }
    }
    Ok(())
}

async fn run_get<T, C>(
    backend: &FixtureBackend,
    id: u64,
    mode: ToggleMode,
    output: Output,
    cells: C,
) -> Result<()>
where
    T: Entity + serde::Serialize,
    FixtureBackend: Resource<T>,
    C: Fn(&T) -> Vec<String>,
{
    let (store, snap) = load_view::<T>(backend).await?;
    let Some(row) = snap.items.iter().find(|t| t.id() == id) else {
        bail!("no {} with id {}", T::KIND.as_str(), id);
    };
    let dispatcher = dispatcher_for(backend, &store, mode);
    let detail = dispatcher.view(row).await;

    match output {
        Output::Human => print_detail(columns::columns_for(T::KIND), cells(&detail)),
        Output::Json => println!("{}", serde_json::to_string_pretty(&detail)?),
    }
    Ok(())
}

async fn run_edit<T>(backend: &FixtureBackend, id: u64, patch: T::Patch) -> Result<()>
where
    T: Entity,
    T::Patch: Validate,
    FixtureBackend: Resource<T>,
{
    let (store, _snap) = load_view::<T>(backend).await?;
    let dispatcher = dispatcher_for(backend, &store, ToggleMode::ServerConfirmed);
    let outcome = dispatcher.edit(id, patch).await?;
    report_outcome(outcome, &format!("updated {} {}", T::KIND.as_str(), id));
    Ok(())
}

async fn run_toggle<T>(backend: &FixtureBackend, id: u64, mode: ToggleMode) -> Result<()>
where
    T: focal_core::ToggleStatus,
    FixtureBackend: Resource<T>,
{
    let (store, _snap) = load_view::<T>(backend).await?;
    let dispatcher = dispatcher_for(backend, &store, mode);
    let outcome = dispatcher.toggle_status(id).await?;
    if outcome == Outcome::Applied {
        if let Some(t) = store.current().items.iter().find(|t| t.id() == id) {
            let state = if t.is_active() { "active" } else { "inactive" };
            println!("{} {} is now {}", T::KIND.as_str(), id, state);
            return Ok(());
        }
    }
    report_outcome(outcome, &format!("toggled {} {}", T::KIND.as_str(), id));
    Ok(())
}

async fn run_delete<T>(backend: &FixtureBackend, id: u64, confirm: &str) -> Result<()>
where
    T: Entity,
    FixtureBackend: Resource<T>,
{
    let (store, _snap) = load_view::<T>(backend).await?;
    let dispatcher = dispatcher_for(backend, &store, ToggleMode::ServerConfirmed);
    let outcome = dispatcher.delete(id, confirm).await?;
    report_outcome(outcome, &format!("deleted {} {}", T::KIND.as_str(), id));
    Ok(())
}

fn report_outcome(outcome: Outcome, applied_msg: &str) {
    match outcome {
        Outcome::Applied => println!("{}", applied_msg),
        Outcome::RejectedInFlight => println!("rejected: same action already in flight"),
        Outcome::StoreGone => println!("dropped: the owning view is gone"),
    }
}

fn print_table<I>(cols: &[ColumnSpec], rows: I)
where
    I: Iterator<Item = Vec<String>>,
{
    let header: Vec<String> =
        cols.iter().map(|c| format!("{:<w$}", c.label.to_uppercase(), w = c.width)).collect();
    println!("{}", header.join("  ").trim_end());
    for cells in rows {
        let line: Vec<String> = cells
            .iter()
            .zip(cols)
            .map(|(cell, c)| format!("{:<w$}", clip(cell, c.width), w = c.width))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

fn print_detail(cols: &[ColumnSpec], cells: Vec<String>) {
    for (c, cell) in cols.iter().zip(cells) {
        println!("{:<13} {}", format!("{}:", c.label), cell);
    }
}

fn print_explain(dbg: &DeriveDebug) {
    eprintln!(
        "debug: total={} after_query={} after_categories={}",
        dbg.total, dbg.after_query, dbg.after_categories
    );
}

fn clip(s: &str, width: usize) -> String {
    let mut chars = s.chars();
    let prefix: String = chars.by_ref().take(width).collect();
    if chars.next().is_none() {
        prefix
    } else {
        let mut clipped: String = prefix.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}

// ---- dashboard summary ----

#[derive(Debug, serde::Serialize)]
struct StatsSummary {
    users_total: usize,
    users_active: usize,
    users_by_role: Vec<(String, usize)>,
    bookings_total: usize,
    bookings_by_status: Vec<(String, usize)>,
    booked_revenue_cents: i64,
    transactions_total: usize,
    settled_cents: i64,
    content_total: usize,
    content_hidden: usize,
    content_flagged: usize,
}

async fn run_stats(backend: &FixtureBackend, output: Output) -> Result<()> {
    let data = backend.dataset().await;

    let mut users_by_role: Vec<(String, usize)> = Vec::new();
    for u in &data.users {
        let role = u.primary_role().as_str().to_string();
        match users_by_role.iter_mut().find(|(r, _)| *r == role) {
            Some((_, n)) => *n += 1,
            None => users_by_role.push((role, 1)),
        }
    }
    let mut bookings_by_status: Vec<(String, usize)> = Vec::new();
    for b in &data.bookings {
        let status = b.status.as_str().to_string();
        match bookings_by_status.iter_mut().find(|(s, _)| *s == status) {
            Some((_, n)) => *n += 1,
            None => bookings_by_status.push((status, 1)),
        }
    }

    let summary = StatsSummary {
        users_total: data.users.len(),
        users_active: data
            .users
            .iter()
            .filter(|u| u.status == focal_core::AccountStatus::Active)
            .count(),
        users_by_role,
        bookings_total: data.bookings.len(),
        bookings_by_status,
        booked_revenue_cents: data
            .bookings
            .iter()
            .filter(|b| {
                matches!(b.status, BookingStatus::Confirmed | BookingStatus::Completed)
            })
            .map(|b| b.amount_cents)
            .sum(),
        transactions_total: data.transactions.len(),
        settled_cents: data
            .transactions
            .iter()
            .filter(|t| {
                matches!(t.status, focal_core::TxnStatus::Paid | focal_core::TxnStatus::Refunded)
            })
            .map(|t| t.amount_cents)
            .sum(),
        content_total: data.content.len(),
        content_hidden: data
            .content
            .iter()
            .filter(|c| c.visibility == focal_core::Visibility::Hidden)
            .count(),
        content_flagged: data.content.iter().filter(|c| c.flags > 0).count(),
    };

    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        Output::Human => {
            println!("users:        {} total, {} active", summary.users_total, summary.users_active);
            for (role, n) in &summary.users_by_role {
                println!("  {:<13} {}", format!("{}:", role), n);
            }
            println!("bookings:     {} total", summary.bookings_total);
            for (status, n) in &summary.bookings_by_status {
                println!("  {:<13} {}", format!("{}:", status), n);
            }
            println!("booked:       {}", columns::format_amount(summary.booked_revenue_cents));
            println!(
                "transactions: {} total, {} settled",
                summary.transactions_total,
                columns::format_amount(summary.settled_cents)
            );
            println!(
                "content:      {} total, {} hidden, {} flagged",
                summary.content_total, summary.content_hidden, summary.content_flagged
            );
        }
    }
    Ok(())
}
