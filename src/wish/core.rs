use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    funding::{LiveFunding, WishFunding, WishStatus},
    money::Money,
    pagination::SortOrder,
    savings::get_aggregate_balance,
    user::UserID,
    wish::WishFundingPolicy,
};

pub type WishId = DatabaseId;

/// Something a user is saving up for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wish {
    /// The id for the wish.
    pub id: WishId,
    /// The user that owns the wish.
    pub user_id: UserID,
    /// What the user wants.
    pub name: String,
    /// Optional detail about the wish.
    pub description: Option<String>,
    /// How much the wish costs, always more than zero.
    pub price: Money,
    /// How much more must be saved, never negative.
    pub amount_still_needed: Money,
    /// Resolved from `price` and `amount_still_needed`.
    pub status: WishStatus,
    /// When the wish was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the wish was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A wish as shown to its owner, with its funding against the current balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishView {
    /// The stored wish.
    #[serde(flatten)]
    pub wish: Wish,
    /// The funding computed from the owner's aggregate savings balance.
    pub live_funding: LiveFunding,
}

impl WishView {
    /// Pair `wish` with its live funding given the aggregate `balance`.
    pub fn new(wish: Wish, balance: Money) -> Self {
        let live_funding = LiveFunding::new(wish.price, balance);
        Self { wish, live_funding }
    }
}

pub fn create_wish_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wish (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            price TEXT NOT NULL,
            amount_still_needed TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('funded', 'partially-funded', 'unfunded')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute("CREATE INDEX IF NOT EXISTS idx_wish_user ON wish(user_id)", ())?;

    Ok(())
}

const WISH_COLUMNS: &str =
    "id, user_id, name, description, price, amount_still_needed, status, created_at, updated_at";

pub fn map_row_to_wish(row: &Row) -> Result<Wish, rusqlite::Error> {
    Ok(Wish {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        amount_still_needed: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// The validated fields of a new wish.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWish {
    /// What the user wants.
    pub name: String,
    /// Optional detail about the wish.
    pub description: Option<String>,
    /// How much the wish costs.
    pub price: Money,
    /// The funding decided by the active policy.
    pub funding: WishFunding,
}

/// Insert a wish owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the wish could not be inserted, e.g.
/// `user_id` does not exist.
pub fn create_wish(
    user_id: UserID,
    new_wish: NewWish,
    connection: &Connection,
) -> Result<Wish, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO wish
            (user_id, name, description, price, amount_still_needed, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        (
            user_id,
            &new_wish.name,
            &new_wish.description,
            new_wish.price,
            new_wish.funding.amount_still_needed,
            new_wish.funding.status,
            now,
        ),
    )?;

    Ok(Wish {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_wish.name,
        description: new_wish.description,
        price: new_wish.price,
        amount_still_needed: new_wish.funding.amount_still_needed,
        status: new_wish.funding.status,
        created_at: now,
        updated_at: now,
    })
}

/// Get the wish `id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the wish does not exist or belongs to
/// another user.
pub fn get_wish(id: WishId, user_id: UserID, connection: &Connection) -> Result<Wish, Error> {
    connection
        .query_row(
            &format!("SELECT {WISH_COLUMNS} FROM wish WHERE id = ?1 AND user_id = ?2"),
            (id, user_id),
            map_row_to_wish,
        )
        .map_err(Error::from)
}

/// The fields to change on a wish, `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub amount_still_needed: Option<Money>,
}

/// Apply `update` to the wish `id` owned by `user_id`, deciding its funding
/// with `policy`.
///
/// Returns the wish as it was before and after the update.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the wish does not exist or belongs to
/// another user.
pub fn update_wish(
    id: WishId,
    user_id: UserID,
    update: WishUpdate,
    policy: WishFundingPolicy,
    connection: &Connection,
) -> Result<(Wish, Wish), Error> {
    let old = get_wish(id, user_id, connection)?;

    let mut new = old.clone();
    if let Some(name) = update.name {
        new.name = name;
    }
    if let Some(description) = update.description {
        new.description = Some(description);
    }
    if let Some(price) = update.price {
        new.price = price;
    }
    let requested = update.amount_still_needed.or(Some(old.amount_still_needed));
    let funding = policy.fund(user_id, new.price, requested, connection)?;
    new.amount_still_needed = funding.amount_still_needed;
    new.status = funding.status;
    new.updated_at = OffsetDateTime::now_utc();

    connection.execute(
        "UPDATE wish
        SET name = ?1, description = ?2, price = ?3, amount_still_needed = ?4, status = ?5,
            updated_at = ?6
        WHERE id = ?7 AND user_id = ?8",
        (
            &new.name,
            &new.description,
            new.price,
            new.amount_still_needed,
            new.status,
            new.updated_at,
            id,
            user_id,
        ),
    )?;

    Ok((old, new))
}

/// Delete the wish `id` owned by `user_id` and return what was deleted.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the wish does not exist or belongs to
/// another user.
pub fn delete_wish(id: WishId, user_id: UserID, connection: &Connection) -> Result<Wish, Error> {
    let deleted = get_wish(id, user_id, connection)?;

    connection.execute(
        "DELETE FROM wish WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(deleted)
}

/// Which of a user's wishes to list and in what order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishFilter {
    /// Only include wishes with this stored status.
    pub status: Option<WishStatus>,
    /// `highest` and `lowest` order by price.
    pub sort: SortOrder,
}

/// List the wishes owned by `user_id` that match `filter`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn list_wishes(
    user_id: UserID,
    filter: &WishFilter,
    connection: &Connection,
) -> Result<Vec<Wish>, Error> {
    let mut wishes = connection
        .prepare(&format!(
            "SELECT {WISH_COLUMNS} FROM wish
            WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map((user_id, filter.status), map_row_to_wish)?
        .collect::<Result<Vec<_>, _>>()?;

    match filter.sort {
        SortOrder::Newest => {}
        SortOrder::Oldest => wishes.reverse(),
        SortOrder::Highest => wishes.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::Lowest => wishes.sort_by(|a, b| a.price.cmp(&b.price)),
    }

    Ok(wishes)
}

/// Recompute the stored funding of every wish owned by `user_id` from their
/// aggregate savings balance.
///
/// Returns the number of wishes that were updated.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the wishes could not be read or updated.
pub fn refresh_wish_funding(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    let balance = get_aggregate_balance(user_id, connection)?;
    let now = OffsetDateTime::now_utc();

    let wishes = connection
        .prepare("SELECT id, price, amount_still_needed, status FROM wish WHERE user_id = ?1")?
        .query_map((user_id,), |row| {
            Ok((
                row.get::<_, WishId>(0)?,
                row.get::<_, Money>(1)?,
                WishFunding {
                    amount_still_needed: row.get(2)?,
                    status: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut statement = connection.prepare(
        "UPDATE wish SET amount_still_needed = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
    )?;
    let mut refreshed = 0;
    for (id, price, stored) in wishes {
        let funding = WishFunding::from_balance(price, balance);
        if funding != stored {
            statement.execute((funding.amount_still_needed, funding.status, now, id))?;
            refreshed += 1;
        }
    }

    Ok(refreshed)
}

/// The number of wishes a user has, split by whether their current savings
/// cover the price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveWishCounts {
    /// Wishes the savings do not cover yet.
    pub active: u64,
    /// Wishes the savings cover.
    pub achieved: u64,
}

/// Count the wishes owned by `user_id` using their live funding.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn count_wishes_by_live_status(
    user_id: UserID,
    connection: &Connection,
) -> Result<LiveWishCounts, Error> {
    let balance = get_aggregate_balance(user_id, connection)?;

    let prices = connection
        .prepare("SELECT price FROM wish WHERE user_id = ?1")?
        .query_map((user_id,), |row| row.get::<_, Money>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(prices
        .into_iter()
        .fold(LiveWishCounts::default(), |mut counts, price| {
            if LiveFunding::new(price, balance).is_funded {
                counts.achieved += 1;
            } else {
                counts.active += 1;
            }
            counts
        }))
}
