use clap::{Parser, Subcommand};

use crate::seed::SeedPlan;

#[derive(Parser)]
#[command(name = "ecofinds-api", version, about = "EcoFinds marketplace API")]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API and the market scheduler
    Serve,

    /// Fill the database with generated members, listings, carts and purchases
    Seed {
        /// Number of members to create
        #[arg(long, default_value = "8")]
        users: usize,

        /// Number of listings to generate
        #[arg(long, default_value = "35")]
        products: usize,
    },
}

impl Command {
    /// Seed plan for `seed`, `None` for every other command.
    pub fn seed_plan(&self) -> Option<SeedPlan> {
        match self {
            Command::Seed { users, products } => Some(SeedPlan {
                users: *users,
                products: *products,
                ..SeedPlan::default()
            }),
            Command::Serve => None,
        }
    }
}
