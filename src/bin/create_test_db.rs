//! Creates a database pre-filled with demo data for manual testing.

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::Duration;

use moneta::{
    CategoryAccess, NewAccount, NewCategory, NewTransaction, NewUser, PasswordHash,
    TransactionType, UserId, ValidatedPassword, create_account, create_category,
    create_transaction, initialize_db, insert_user, mark_user_verified, reconcile_on_create,
};

/// A utility for creating a test database for the moneta API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    // The password skips the strength gate on purpose, this database is for
    // local testing only.
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = insert_user(
        NewUser {
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            email: "test@example.com".to_owned(),
            password_hash,
        },
        &conn,
    )?;
    mark_user_verified(user.id, &conn)?;

    println!("Creating demo accounts...");

    let checking = create_account(
        NewAccount {
            user_id: user.id,
            name: "Everyday Checking".to_owned(),
            description: Some("Day to day spending.".to_owned()),
            number: Some("12-3456-7890123-00".to_owned()),
            provider: Some("Kiwibank".to_owned()),
            account_type: Some("checking".to_owned()),
            currency: "NZD".to_owned(),
            balance: 1_000.0,
        },
        &conn,
    )?;
    create_account(
        NewAccount {
            user_id: user.id,
            name: "Rainy Day Savings".to_owned(),
            description: None,
            number: None,
            provider: Some("Kiwibank".to_owned()),
            account_type: Some("savings".to_owned()),
            currency: "NZD".to_owned(),
            balance: 5_000.0,
        },
        &conn,
    )?;

    println!("Creating demo categories...");

    for name in ["Groceries", "Rent", "Salary"] {
        create_category(
            NewCategory {
                user_id: user.id,
                name: name.to_owned(),
                ancestor_id: None,
                access: CategoryAccess::Public,
            },
            &conn,
        )?;
    }

    println!("Creating demo transactions...");

    let today = time::OffsetDateTime::now_utc().date();
    let demo_transactions = [
        ("Weekly shop", 112.50, TransactionType::Expense, "groceries", 9),
        ("Rent", 450.0, TransactionType::Expense, "rent", 7),
        ("Pay day", 1_850.0, TransactionType::Income, "salary", 5),
        ("Weekly shop", 98.20, TransactionType::Expense, "groceries", 2),
    ];

    for (title, amount, transaction_type, category, days_ago) in demo_transactions {
        seed_transaction(
            user.id,
            checking.id,
            title,
            amount,
            transaction_type,
            category,
            today - Duration::days(days_ago),
            &conn,
        )?;
    }

    println!("Success!");
    println!("Log in with 'test@example.com' and the password 'test'.");

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn seed_transaction(
    user_id: UserId,
    account_id: i64,
    title: &str,
    amount: f64,
    transaction_type: TransactionType,
    category: &str,
    date: time::Date,
    conn: &Connection,
) -> Result<(), Box<dyn Error>> {
    let transaction = create_transaction(
        NewTransaction {
            user_id,
            account_id: Some(account_id),
            title: title.to_owned(),
            description: None,
            amount,
            cost: 0.0,
            transaction_type,
            currency: "NZD".to_owned(),
            category: Some(category.to_owned()),
            date,
        },
        conn,
    )?;
    reconcile_on_create(&transaction, conn)?;

    Ok(())
}
