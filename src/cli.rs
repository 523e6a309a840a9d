//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Supplier ordering service for restaurants.
#[derive(Parser, Debug)]
#[command(name = "restock", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API (the default).
    Serve,

    /// Manage API bearer tokens.
    #[command(subcommand)]
    Token(TokenCommand),

    /// Parse free-text order lines from a file or stdin.
    Parse(ParseArgs),
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Issue a new token for a restaurant.
    Issue(RestaurantArgs),
    /// List the tokens issued for a restaurant.
    List(RestaurantArgs),
    /// Revoke a token.
    Revoke(RevokeArgs),
}

#[derive(Args, Debug)]
pub struct RestaurantArgs {
    #[arg(long)]
    pub restaurant: i64,
}

#[derive(Args, Debug)]
pub struct RevokeArgs {
    #[arg(long)]
    pub restaurant: i64,
    #[arg(long)]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// File to read; stdin when omitted.
    pub file: Option<PathBuf>,

    /// Print the parsed lines as JSON.
    #[arg(long)]
    pub json: bool,
}
