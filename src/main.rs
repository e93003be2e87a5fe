use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use drinks_client::config::{load_config, print_schema};
use drinks_client::startup::build_store;
use drinks_client::utils::init_logging;
use drinks_client::{Drink, DrinkId, DrinkStore, Ingredient, StoreError};

/// Command line client for the coffee shop drinks API.
#[derive(Parser)]
#[command(name = "drinks", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List drinks (detailed when the session has get:drinks-detail).
    List,
    /// Create a drink. Ingredients are written name:color:parts.
    Create {
        title: String,
        ingredients: Vec<Ingredient>,
    },
    /// Replace the title and recipe of an existing drink.
    Update {
        id: u64,
        title: String,
        ingredients: Vec<Ingredient>,
    },
    /// Delete a drink by id.
    Delete { id: u64 },
    /// Print the JSON schema of the config file.
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Schema = cli.command {
        return match print_schema() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error printing schema: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging()) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    let store = match build_store(&config) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &store).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, store: &DrinkStore) -> Result<(), StoreError> {
    match command {
        Command::List => {
            store.fetch_all().await?;
        }
        Command::Create { title, ingredients } => {
            store.save(&Drink::unsaved(title, ingredients)).await?;
        }
        Command::Update {
            id,
            title,
            ingredients,
        } => {
            let drink = Drink {
                id: DrinkId::Persisted(id),
                title,
                recipe: ingredients,
            };
            store.save(&drink).await?;
        }
        Command::Delete { id } => {
            let drink = Drink {
                id: DrinkId::Persisted(id),
                title: String::new(),
                recipe: Vec::new(),
            };
            store.remove(&drink).await?;
            println!("deleted drink {}", id);
            return Ok(());
        }
        // Printed before the store is built.
        Command::Schema => return Ok(()),
    }

    for (id, drink) in store.drinks().await {
        println!("{:>4}  {}", id, drink.title);
        for ingredient in &drink.recipe {
            let name = ingredient.name.as_deref().unwrap_or("-");
            match ingredient.parts {
                Some(parts) => println!("        {} ({}) x{}", name, ingredient.color, parts),
                None => println!("        {} ({})", name, ingredient.color),
            }
        }
    }
    Ok(())
}
