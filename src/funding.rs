//! The derivation rules for savings totals and wish funding.
//!
//! Every endpoint that stores or displays a savings total or a wish status
//! goes through the functions in this module. They are pure and assume their
//! inputs have already been validated, e.g. prices are positive and income
//! is not negative.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::money::{MONEY_SCALE, Money};

/// The total of a savings account: `income - expense`.
///
/// The result is not clamped, a negative total is a valid overdrawn account.
pub fn compute_savings_total(income: Money, expense: Money) -> Money {
    income - expense
}

/// How far a wish is from being paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WishStatus {
    /// Nothing more is needed.
    Funded,
    /// Some, but not all, of the price has been saved.
    PartiallyFunded,
    /// Nothing has been saved towards the price.
    Unfunded,
}

impl WishStatus {
    /// The status as it appears in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WishStatus::Funded => "funded",
            WishStatus::PartiallyFunded => "partially-funded",
            WishStatus::Unfunded => "unfunded",
        }
    }
}

impl Display for WishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The text was not one of "funded", "partially-funded" or "unfunded".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a valid wish status")]
pub struct InvalidWishStatus(pub String);

impl FromStr for WishStatus {
    type Err = InvalidWishStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funded" => Ok(WishStatus::Funded),
            "partially-funded" => Ok(WishStatus::PartiallyFunded),
            "unfunded" => Ok(WishStatus::Unfunded),
            other => Err(InvalidWishStatus(other.to_owned())),
        }
    }
}

impl ToSql for WishStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for WishStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Resolve the status of a wish with the given `price` when
/// `amount_still_needed` more money is required to pay for it.
///
/// - zero still needed: [WishStatus::Funded]
/// - less than the price still needed: [WishStatus::PartiallyFunded]
/// - the whole price (or more) still needed: [WishStatus::Unfunded]
pub fn resolve_wish_status(price: Money, amount_still_needed: Money) -> WishStatus {
    if amount_still_needed.is_zero() {
        WishStatus::Funded
    } else if amount_still_needed.is_positive() && amount_still_needed < price {
        WishStatus::PartiallyFunded
    } else {
        WishStatus::Unfunded
    }
}

/// Like [resolve_wish_status], but a missing `amount_still_needed` is taken
/// to be the whole price.
pub fn resolve_wish_status_or_default(
    price: Money,
    amount_still_needed: Option<Money>,
) -> WishStatus {
    resolve_wish_status(price, amount_still_needed.unwrap_or(price))
}

/// How much more must be saved to afford `price` given the aggregate savings
/// `balance`, never less than zero.
pub fn amount_still_needed(price: Money, balance: Money) -> Money {
    (price - balance).max(Money::ZERO)
}

/// The stored funding fields of a wish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WishFunding {
    /// How much more must be saved.
    pub amount_still_needed: Money,
    /// The status resolved from the price and `amount_still_needed`.
    pub status: WishStatus,
}

impl WishFunding {
    /// Funding from a caller supplied shortfall, defaulting to the whole price.
    pub fn from_shortfall(price: Money, amount_still_needed: Option<Money>) -> Self {
        let amount_still_needed = amount_still_needed.unwrap_or(price);

        Self {
            amount_still_needed,
            status: resolve_wish_status(price, amount_still_needed),
        }
    }

    /// Funding derived from the owner's aggregate savings `balance`.
    pub fn from_balance(price: Money, balance: Money) -> Self {
        Self::from_shortfall(price, Some(amount_still_needed(price, balance)))
    }
}

/// The funding of a wish as shown to the user, computed from the current
/// aggregate savings balance. This is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiveFunding {
    /// Whether the balance covers the whole price.
    pub is_funded: bool,
    /// How much more must be saved.
    pub amount_still_needed: Money,
    /// The balance as a percentage of the price, between 0 and 100 with two
    /// fractional digits. Serialized as a string like the amounts.
    pub progress_percent: Decimal,
}

impl LiveFunding {
    /// Compute the live funding of a wish costing `price` from the aggregate
    /// savings `balance`.
    pub fn new(price: Money, balance: Money) -> Self {
        Self {
            is_funded: balance >= price,
            amount_still_needed: amount_still_needed(price, balance),
            progress_percent: progress_percent(price, balance),
        }
    }
}

fn progress_percent(price: Money, balance: Money) -> Decimal {
    if !balance.is_positive() {
        return Decimal::new(0, MONEY_SCALE);
    }

    let percent = balance
        .as_decimal()
        .checked_div(price.as_decimal())
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(dec!(100))
        .min(dec!(100));

    let mut percent =
        percent.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    percent.rescale(MONEY_SCALE);
    percent
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::money::Money;

    use super::{
        LiveFunding, WishFunding, WishStatus, amount_still_needed, compute_savings_total,
        resolve_wish_status, resolve_wish_status_or_default,
    };

    fn money(value: rust_decimal::Decimal) -> Money {
        Money::new(value).unwrap()
    }

    #[test]
    fn total_is_income_minus_expense() {
        let cases = [
            (dec!(5000000), dec!(2000000), dec!(3000000)),
            (dec!(3000000), dec!(1500000), dec!(1500000)),
            (dec!(0.10), dec!(0.20), dec!(-0.10)),
            (dec!(0), dec!(0), dec!(0)),
        ];

        for (income, expense, want) in cases {
            assert_eq!(
                compute_savings_total(money(income), money(expense)),
                money(want),
                "income {income} expense {expense}"
            );
        }
    }

    #[test]
    fn total_keeps_two_fractional_digits() {
        let total = compute_savings_total(money(dec!(100.10)), money(dec!(0.05)));

        assert_eq!(total.to_string(), "100.05");
    }

    #[test]
    fn overdrawn_account_has_negative_total() {
        let total = compute_savings_total(money(dec!(1000)), money(dec!(2500)));

        assert_eq!(total, money(dec!(-1500)));
    }

    #[test]
    fn nothing_still_needed_is_funded() {
        for price in [dec!(0.01), dec!(1), dec!(15000000)] {
            assert_eq!(
                resolve_wish_status(money(price), Money::ZERO),
                WishStatus::Funded
            );
        }
    }

    #[test]
    fn whole_price_or_more_still_needed_is_unfunded() {
        let price = money(dec!(15000000));

        assert_eq!(resolve_wish_status(price, price), WishStatus::Unfunded);
        assert_eq!(
            resolve_wish_status(price, money(dec!(20000000))),
            WishStatus::Unfunded
        );
    }

    #[test]
    fn some_still_needed_is_partially_funded() {
        let price = money(dec!(15000000));

        for still_needed in [dec!(0.01), dec!(5000000), dec!(14999999.99)] {
            assert_eq!(
                resolve_wish_status(price, money(still_needed)),
                WishStatus::PartiallyFunded
            );
        }
    }

    #[test]
    fn resolving_status_is_idempotent() {
        let price = money(dec!(18000000));
        let still_needed = money(dec!(9000000));

        let first = resolve_wish_status(price, still_needed);
        let second = resolve_wish_status(price, still_needed);

        assert_eq!(first, second);
    }

    #[test]
    fn missing_amount_defaults_to_unfunded() {
        assert_eq!(
            resolve_wish_status_or_default(money(dec!(25000000)), None),
            WishStatus::Unfunded
        );
        assert_eq!(
            WishFunding::from_shortfall(money(dec!(25000000)), None),
            WishFunding {
                amount_still_needed: money(dec!(25000000)),
                status: WishStatus::Unfunded,
            }
        );
    }

    #[test]
    fn amount_still_needed_is_never_negative() {
        assert_eq!(
            amount_still_needed(money(dec!(100)), money(dec!(250))),
            Money::ZERO
        );
        assert_eq!(
            amount_still_needed(money(dec!(100)), money(dec!(-50))),
            money(dec!(150))
        );
    }

    #[test]
    fn account_total_is_three_million() {
        assert_eq!(
            compute_savings_total(money(dec!(5000000)), money(dec!(2000000))).to_string(),
            "3000000.00"
        );
    }

    #[test]
    fn fully_saved_wish_is_funded() {
        assert_eq!(
            resolve_wish_status(money(dec!(18000000)), money(dec!(0))),
            WishStatus::Funded
        );
    }

    #[test]
    fn five_million_short_of_fifteen_million_is_partially_funded() {
        assert_eq!(
            resolve_wish_status(money(dec!(15000000)), money(dec!(5000000))),
            WishStatus::PartiallyFunded
        );
    }

    #[test]
    fn caller_supplied_whole_price_is_unfunded() {
        let price = money(dec!(25000000));

        assert_eq!(
            resolve_wish_status(price, money(dec!(25000000))),
            WishStatus::Unfunded
        );
        assert_eq!(
            WishFunding::from_shortfall(price, Some(money(dec!(25000000)))).status,
            WishStatus::Unfunded
        );
    }

    // Two accounts: bca 5,000,000 - 2,000,000 and mandiri 3,000,000 - 1,500,000.
    fn two_account_balance() -> Money {
        [
            compute_savings_total(money(dec!(5000000)), money(dec!(2000000))),
            compute_savings_total(money(dec!(3000000)), money(dec!(1500000))),
        ]
        .into_iter()
        .sum()
    }

    #[test]
    fn balance_sums_every_account_total() {
        assert_eq!(two_account_balance(), money(dec!(4500000)));
    }

    #[test]
    fn wish_above_balance_is_partially_funded() {
        let price = money(dec!(15000000));

        let funding = WishFunding::from_balance(price, two_account_balance());
        let live = LiveFunding::new(price, two_account_balance());

        assert_eq!(funding.amount_still_needed, money(dec!(10500000)));
        assert_eq!(funding.status, WishStatus::PartiallyFunded);
        assert!(!live.is_funded);
        assert_eq!(live.progress_percent, dec!(30.00));
    }

    #[test]
    fn wish_below_balance_is_funded() {
        let price = money(dec!(4000000));

        let funding = WishFunding::from_balance(price, two_account_balance());
        let live = LiveFunding::new(price, two_account_balance());

        assert_eq!(funding.amount_still_needed, Money::ZERO);
        assert_eq!(funding.status, WishStatus::Funded);
        assert!(live.is_funded);
        assert_eq!(live.progress_percent, dec!(100.00));
    }

    #[test]
    fn wish_without_savings_is_unfunded() {
        let price = money(dec!(25000000));

        let funding = WishFunding::from_balance(price, Money::ZERO);
        let live = LiveFunding::new(price, Money::ZERO);

        assert_eq!(funding.status, WishStatus::Unfunded);
        assert_eq!(funding.amount_still_needed, price);
        assert!(!live.is_funded);
        assert_eq!(live.progress_percent, dec!(0.00));
    }

    #[test]
    fn negative_balance_has_no_progress() {
        let live = LiveFunding::new(money(dec!(100)), money(dec!(-20)));

        assert_eq!(live.progress_percent, dec!(0));
        assert_eq!(live.amount_still_needed, money(dec!(120)));
    }

    #[test]
    fn progress_is_rounded_to_two_digits() {
        let live = LiveFunding::new(money(dec!(3)), money(dec!(1)));

        assert_eq!(live.progress_percent.to_string(), "33.33");
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            WishStatus::Funded,
            WishStatus::PartiallyFunded,
            WishStatus::Unfunded,
        ] {
            assert_eq!(status.as_str().parse::<WishStatus>(), Ok(status));
        }

        assert!("pending".parse::<WishStatus>().is_err());
    }

    #[test]
    fn status_serializes_in_kebab_case() {
        assert_eq!(
            serde_json::to_value(WishStatus::PartiallyFunded).unwrap(),
            serde_json::json!("partially-funded")
        );
    }
}
