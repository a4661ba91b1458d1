//! Spindle CLI - drive a cart session against the shop API.
//!
//! # Usage
//!
//! ```bash
//! # Show a customer's cart with live catalog data
//! spindle --email customer@example.com show
//!
//! # Add or remove one unit of a record
//! spindle --email customer@example.com add --record 12
//! spindle --email customer@example.com remove --record 12
//!
//! # Turn the cart into an order
//! spindle --email customer@example.com checkout
//! ```
//!
//! Configuration comes from the environment (or a `.env` file): see
//! `SHOP_API_BASE_URL`, `SHOP_API_TOKEN`, `SHOP_API_TIMEOUT_SECS`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "spindle")]
#[command(author, version, about = "Spindle cart session driver")]
struct Cli {
    /// Email of the customer whose cart to work with
    #[arg(short, long)]
    email: String,

    /// View the cart read-only as an admin (mutations disabled)
    #[arg(long)]
    admin_view: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the cart and print its lines and totals
    Show,
    /// Add one unit of a record to the cart
    Add {
        /// Record id to add
        #[arg(short, long)]
        record: i32,
    },
    /// Remove one unit of a record from the cart
    Remove {
        /// Record id to remove
        #[arg(short, long)]
        record: i32,
    },
    /// Create an order from the cart
    Checkout {
        /// Payment method to charge
        #[arg(long, default_value = "credit-card")]
        payment_method: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let role = if cli.admin_view {
        spindle_core::Role::Admin
    } else {
        spindle_core::Role::Customer
    };
    let session = commands::open_session(&cli.email, role).await?;

    match cli.command {
        Commands::Show => {}
        Commands::Add { record } => commands::add(&session, record).await,
        Commands::Remove { record } => commands::remove(&session, record).await,
        Commands::Checkout { payment_method } => {
            commands::checkout(&session, &payment_method).await;
        }
    }

    commands::print_cart(&session);
    Ok(())
}
