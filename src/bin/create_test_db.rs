use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use savewish::{
    NewSavings, NewWish, PasswordHash, ValidatedPassword, WishFundingPolicy, create_savings,
    create_wish, initialize_db,
    money::Money,
    record_activity,
    user::{NewUser, create_user},
};

/// A utility for creating a test database for the REST API server of savewish.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// The password of every demo user.
const DEMO_PASSWORD: &str = "password123";

struct DemoUser {
    name: &'static str,
    email: &'static str,
    phone_number: &'static str,
    /// Bank, income and expense.
    savings: &'static [(&'static str, Decimal, Decimal)],
    /// Name, description and price.
    wishes: &'static [(&'static str, &'static str, Decimal)],
}

const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        name: "Ahmad Rizki",
        email: "ahmad@example.com",
        phone_number: "081234567890",
        savings: &[
            ("BCA", dec!(5000000), dec!(2000000)),
            ("Mandiri", dec!(3000000), dec!(1500000)),
        ],
        wishes: &[
            ("Laptop", "A laptop for work", dec!(15000000)),
            ("Headphones", "Noise cancelling", dec!(2500000)),
        ],
    },
    DemoUser {
        name: "Siti Nurhaliza",
        email: "siti@example.com",
        phone_number: "081298765432",
        savings: &[("BNI", dec!(8000000), dec!(3000000))],
        wishes: &[
            ("Motorbike", "For the commute", dec!(18000000)),
            ("Phone", "A new phone", dec!(4000000)),
        ],
    },
    DemoUser {
        name: "Budi Santoso",
        email: "budi@example.com",
        phone_number: "081355512345",
        savings: &[
            ("BRI", dec!(2000000), dec!(500000)),
            ("BCA", dec!(1000000), dec!(1200000)),
        ],
        wishes: &[("Holiday", "A trip to Bali", dec!(25000000))],
    },
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'savewish.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'savewish.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    let password_hash = PasswordHash::new(
        ValidatedPassword::new(DEMO_PASSWORD)?,
        PasswordHash::DEFAULT_COST,
    )?;

    for demo in &DEMO_USERS {
        println!("Creating demo user {}...", demo.email);
        create_demo_user(demo, &password_hash, &connection)?;
    }

    println!("Success! Every demo user has the password {DEMO_PASSWORD:?}.");

    Ok(())
}

fn create_demo_user(
    demo: &DemoUser,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    let tx = connection.unchecked_transaction()?;

    let user = create_user(
        NewUser {
            name: demo.name.to_owned(),
            email: EmailAddress::new_unchecked(demo.email),
            password_hash: password_hash.clone(),
            avatar: None,
            phone_number: Some(demo.phone_number.to_owned()),
        },
        &tx,
    )?;
    record_activity(
        &*tx,
        user.id,
        "User registered",
        json!({ "email": demo.email, "name": demo.name }),
    );

    for (bank, income, expense) in demo.savings {
        let account = create_savings(
            user.id,
            NewSavings {
                bank: (*bank).to_owned(),
                income: Money::new(*income)?,
                expense: Money::new(*expense)?,
            },
            &tx,
        )?;
        record_activity(
            &*tx,
            user.id,
            "Created new saving",
            json!({
                "saving_id": account.id,
                "bank": account.bank,
                "income": account.income,
                "expense": account.expense,
                "total": account.total,
            }),
        );
    }

    for (name, description, price) in demo.wishes {
        let price = Money::new(*price)?;
        let funding = WishFundingPolicy::LiveBalance.fund(user.id, price, None, &tx)?;
        let wish = create_wish(
            user.id,
            NewWish {
                name: (*name).to_owned(),
                description: Some((*description).to_owned()),
                price,
                funding,
            },
            &tx,
        )?;
        record_activity(
            &*tx,
            user.id,
            "Created new wish",
            json!({
                "wish_id": wish.id,
                "wish_name": wish.name,
                "price": wish.price,
                "status": wish.status,
            }),
        );
    }

    tx.commit()?;

    Ok(())
}
