use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{escape_like, query_count},
    funding::compute_savings_total,
    money::Money,
    pagination::SortOrder,
    user::UserID,
};

pub type SavingsId = DatabaseId;

/// The income and expense recorded for one bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsAccount {
    /// The id for the savings account.
    pub id: SavingsId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The name of the bank the money is held in.
    pub bank: String,
    /// The money paid into the account.
    pub income: Money,
    /// The money taken out of the account.
    pub expense: Money,
    /// `income - expense`, negative when the account is overdrawn.
    pub total: Money,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the account was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub fn create_savings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            bank TEXT NOT NULL,
            income TEXT NOT NULL,
            expense TEXT NOT NULL,
            total TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_savings_user ON savings(user_id)",
        (),
    )?;

    Ok(())
}

const SAVINGS_COLUMNS: &str = "id, user_id, bank, income, expense, total, created_at, updated_at";

pub fn map_row_to_savings(row: &Row) -> Result<SavingsAccount, rusqlite::Error> {
    Ok(SavingsAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        bank: row.get(2)?,
        income: row.get(3)?,
        expense: row.get(4)?,
        total: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// The validated fields of a new savings account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavings {
    /// The name of the bank.
    pub bank: String,
    /// The money paid in.
    pub income: Money,
    /// The money taken out.
    pub expense: Money,
}

/// Insert a savings account owned by `user_id`, deriving its total.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the account could not be inserted, e.g.
/// `user_id` does not exist.
pub fn create_savings(
    user_id: UserID,
    new_savings: NewSavings,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    let now = OffsetDateTime::now_utc();
    let total = compute_savings_total(new_savings.income, new_savings.expense);

    connection.execute(
        "INSERT INTO savings (user_id, bank, income, expense, total, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            user_id,
            &new_savings.bank,
            new_savings.income,
            new_savings.expense,
            total,
            now,
        ),
    )?;

    Ok(SavingsAccount {
        id: connection.last_insert_rowid(),
        user_id,
        bank: new_savings.bank,
        income: new_savings.income,
        expense: new_savings.expense,
        total,
        created_at: now,
        updated_at: now,
    })
}

/// Get the savings account `id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn get_savings(
    id: SavingsId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    connection
        .query_row(
            &format!("SELECT {SAVINGS_COLUMNS} FROM savings WHERE id = ?1 AND user_id = ?2"),
            (id, user_id),
            map_row_to_savings,
        )
        .map_err(Error::from)
}

/// The fields to change on a savings account, `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavingsUpdate {
    pub bank: Option<String>,
    pub income: Option<Money>,
    pub expense: Option<Money>,
}

/// Apply `update` to the savings account `id` owned by `user_id` and
/// recompute its total.
///
/// Returns the account as it was before and after the update.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn update_savings(
    id: SavingsId,
    user_id: UserID,
    update: SavingsUpdate,
    connection: &Connection,
) -> Result<(SavingsAccount, SavingsAccount), Error> {
    let old = get_savings(id, user_id, connection)?;

    let mut new = old.clone();
    if let Some(bank) = update.bank {
        new.bank = bank;
    }
    if let Some(income) = update.income {
        new.income = income;
    }
    if let Some(expense) = update.expense {
        new.expense = expense;
    }
    new.total = compute_savings_total(new.income, new.expense);
    new.updated_at = OffsetDateTime::now_utc();

    connection.execute(
        "UPDATE savings
        SET bank = ?1, income = ?2, expense = ?3, total = ?4, updated_at = ?5
        WHERE id = ?6 AND user_id = ?7",
        (
            &new.bank,
            new.income,
            new.expense,
            new.total,
            new.updated_at,
            id,
            user_id,
        ),
    )?;

    Ok((old, new))
}

/// Delete the savings account `id` owned by `user_id` and return what was deleted.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn delete_savings(
    id: SavingsId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    let deleted = get_savings(id, user_id, connection)?;

    connection.execute(
        "DELETE FROM savings WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(deleted)
}

/// Which of a user's savings accounts to list and in what order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavingsFilter {
    /// Only include accounts whose bank contains this text.
    pub bank: Option<String>,
    /// `highest` and `lowest` order by total.
    pub sort: SortOrder,
}

/// List the savings accounts owned by `user_id` that match `filter`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn list_savings(
    user_id: UserID,
    filter: &SavingsFilter,
    connection: &Connection,
) -> Result<Vec<SavingsAccount>, Error> {
    let pattern = filter
        .bank
        .as_ref()
        .map(|bank| format!("%{}%", escape_like(bank)));

    let mut accounts = connection
        .prepare(&format!(
            "SELECT {SAVINGS_COLUMNS} FROM savings
            WHERE user_id = ?1 AND (?2 IS NULL OR bank LIKE ?2 ESCAPE '\\')
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map((user_id, &pattern), map_row_to_savings)?
        .collect::<Result<Vec<_>, _>>()?;

    // Amounts are stored as text, so they are compared here rather than in SQL.
    match filter.sort {
        SortOrder::Newest => {}
        SortOrder::Oldest => accounts.reverse(),
        SortOrder::Highest => accounts.sort_by(|a, b| b.total.cmp(&a.total)),
        SortOrder::Lowest => accounts.sort_by(|a, b| a.total.cmp(&b.total)),
    }

    Ok(accounts)
}

/// Totals over a list of savings accounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub total_income: Money,
    pub total_expense: Money,
    pub grand_total: Money,
    pub count: usize,
}

impl SavingsSummary {
    pub fn new(accounts: &[SavingsAccount]) -> Self {
        Self {
            total_income: accounts.iter().map(|account| account.income).sum(),
            total_expense: accounts.iter().map(|account| account.expense).sum(),
            grand_total: accounts.iter().map(|account| account.total).sum(),
            count: accounts.len(),
        }
    }
}

/// The sum of the totals of every savings account owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_aggregate_balance(user_id: UserID, connection: &Connection) -> Result<Money, Error> {
    let totals = connection
        .prepare("SELECT total FROM savings WHERE user_id = ?1")?
        .query_map((user_id,), |row| row.get::<_, Money>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(totals.into_iter().sum())
}

/// The number of savings accounts owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn count_savings(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    query_count(
        connection,
        "SELECT COUNT(id) FROM savings WHERE user_id = ?1",
        (user_id,),
    )
}


#[cfg(test)]
mod savings_query_tests {
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        money::Money,
        pagination::SortOrder,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{
        NewSavings, SavingsFilter, SavingsSummary, SavingsUpdate, count_savings, create_savings,
        delete_savings, get_aggregate_balance, get_savings, list_savings, update_savings,
    };

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount).unwrap()
    }

    fn new_savings(bank: &str, income: rust_decimal::Decimal, expense: rust_decimal::Decimal) -> NewSavings {
        NewSavings {
            bank: bank.to_owned(),
            income: money(income),
            expense: money(expense),
        }
    }

    #[test]
    fn create_derives_total() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");

        let account = create_savings(
            user.id,
            new_savings("BCA", dec!(5000000), dec!(2000000)),
            &connection,
        )
        .unwrap();

        assert_eq!(account.total, money(dec!(3000000)));
        assert_eq!(get_savings(account.id, user.id, &connection), Ok(account));
    }

    #[test]
    fn overdrawn_total_is_negative() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");

        let account = create_savings(
            user.id,
            new_savings("Mandiri", dec!(1000000), dec!(1500000)),
            &connection,
        )
        .unwrap();

        assert_eq!(account.total, money(dec!(-500000)));
    }

    #[test]
    fn partial_update_keeps_omitted_fields_and_recomputes_total() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        let account = create_savings(
            user.id,
            new_savings("BCA", dec!(5000000), dec!(2000000)),
            &connection,
        )
        .unwrap();

        let (old, new) = update_savings(
            account.id,
            user.id,
            SavingsUpdate {
                expense: Some(money(dec!(2500000))),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(old, account);
        assert_eq!(new.bank, "BCA");
        assert_eq!(new.income, money(dec!(5000000)));
        assert_eq!(new.total, money(dec!(2500000)));
        assert_eq!(get_savings(account.id, user.id, &connection), Ok(new));
    }

    #[test]
    fn other_users_accounts_are_not_found() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection, "ahmad@example.com");
        let other = create_test_user(&connection, "siti@example.com");
        let account = create_savings(
            owner.id,
            new_savings("BCA", dec!(100), dec!(0)),
            &connection,
        )
        .unwrap();

        assert_eq!(get_savings(account.id, other.id, &connection), Err(Error::NotFound));
        assert_eq!(
            update_savings(account.id, other.id, SavingsUpdate::default(), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(delete_savings(account.id, other.id, &connection), Err(Error::NotFound));
        assert_eq!(count_savings(owner.id, &connection), Ok(1));
    }

    #[test]
    fn delete_returns_deleted_account() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        let account = create_savings(
            user.id,
            new_savings("BCA", dec!(100), dec!(0)),
            &connection,
        )
        .unwrap();

        assert_eq!(delete_savings(account.id, user.id, &connection), Ok(account.clone()));
        assert_eq!(get_savings(account.id, user.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn list_filters_by_bank_and_sorts_by_total() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        let other = create_test_user(&connection, "siti@example.com");
        create_savings(user.id, new_savings("BCA Tahapan", dec!(300), dec!(0)), &connection).unwrap();
        create_savings(user.id, new_savings("Mandiri", dec!(900), dec!(0)), &connection).unwrap();
        create_savings(user.id, new_savings("BCA Xpresi", dec!(700), dec!(0)), &connection).unwrap();
        create_savings(other.id, new_savings("BCA", dec!(5000), dec!(0)), &connection).unwrap();

        let accounts = list_savings(
            user.id,
            &SavingsFilter {
                bank: Some("bca".to_owned()),
                sort: SortOrder::Highest,
            },
            &connection,
        )
        .unwrap();

        let banks: Vec<_> = accounts.iter().map(|account| account.bank.as_str()).collect();
        assert_eq!(banks, ["BCA Xpresi", "BCA Tahapan"]);
    }

    #[test]
    fn list_defaults_to_newest_first() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        create_savings(user.id, new_savings("First", dec!(1), dec!(0)), &connection).unwrap();
        create_savings(user.id, new_savings("Second", dec!(1), dec!(0)), &connection).unwrap();

        let newest = list_savings(user.id, &SavingsFilter::default(), &connection).unwrap();
        let oldest = list_savings(
            user.id,
            &SavingsFilter {
                sort: SortOrder::Oldest,
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(newest[0].bank, "Second");
        assert_eq!(oldest[0].bank, "First");
    }

    #[test]
    fn summary_and_aggregate_balance_add_up() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");
        create_savings(user.id, new_savings("BCA", dec!(5000000), dec!(2000000)), &connection).unwrap();
        create_savings(user.id, new_savings("Mandiri", dec!(1000000), dec!(1500000)), &connection).unwrap();

        let accounts = list_savings(user.id, &SavingsFilter::default(), &connection).unwrap();
        let summary = SavingsSummary::new(&accounts);

        assert_eq!(summary.total_income, money(dec!(6000000)));
        assert_eq!(summary.total_expense, money(dec!(3500000)));
        assert_eq!(summary.grand_total, money(dec!(2500000)));
        assert_eq!(summary.count, 2);
        assert_eq!(get_aggregate_balance(user.id, &connection), Ok(money(dec!(2500000))));
    }

    #[test]
    fn aggregate_balance_is_zero_without_accounts() {
        let connection = get_test_connection();
        let user = create_test_user(&connection, "ahmad@example.com");

        assert_eq!(get_aggregate_balance(user.id, &connection), Ok(Money::ZERO));
    }
}
