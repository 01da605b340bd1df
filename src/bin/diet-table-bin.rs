use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::log_enabled;

use diet_table_rs::colors::swatch;
use diet_table_rs::constants::{FOOD_SEARCH_LIMIT, LOCAL_DB};
use diet_table_rs::data_backend::rest_client::RestClient;
use diet_table_rs::data_backend::DietApi;
use diet_table_rs::diet_page::{DietPage, SaveOutcome};
use diet_table_rs::diet_table::render::render_text;
use diet_table_rs::food_catalog::{dominant_macro, FoodCatalog};
use diet_table_rs::local_store::LocalStore;
use diet_table_rs::references::{list_diet_names, References};
use diet_table_rs::settings_store::SettingsStore;
use diet_table_rs::shared_main::logger_init;

/// Edit diet tables of a nutrition server from the terminal.
/// {n}Edits are saved the same way the web table saves them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base url of the server{n}Example: <http://127.0.0.1:8000>
    #[arg(short, long, env = "DIET_API_URL")]
    base_url: String,
    /// Session token, sent as the auth_token cookie
    #[arg(short, long, env = "DIET_AUTH_TOKEN")]
    token: Option<String>,
    /// SQLite file holding local preferences
    #[arg(long, env = "DIET_LOCAL_DB", default_value = LOCAL_DB)]
    local_db: String,
    /// enable verbose logging (mostly request timings){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List all diets
    Diets,
    /// Print a diet table with totals and RDA/UL percentages
    Show { diet: String },
    /// Change the quantity of a row (rows count from 1)
    SetQuantity {
        diet: String,
        row: usize,
        quantity: String,
    },
    /// Swap the food of a row
    SetFood { diet: String, row: usize, fdc_id: i64 },
    /// Pick a row color (hex or palette slot 1-6), or clear it by picking the
    /// same color again
    Color { diet: String, row: usize, color: String },
    /// Move a row to another position
    Reorder { diet: String, from: usize, to: usize },
    /// Append a placeholder item
    Add { diet: String },
    /// Remove a row
    Delete { diet: String, row: usize },
    /// Remove a whole diet
    DeleteDiet { diet: String },
    /// Rename a diet
    Rename { diet: String, new_name: String },
    /// Fuzzy search the food catalog
    Search {
        query: String,
        #[arg(short, long, default_value_t = FOOD_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Create or refresh a food from Food Data Central
    ImportFood { fdc_id: i64 },
    /// Print settings, or change them
    Settings {
        /// Comma separated diet columns to show
        #[arg(long)]
        columns: Option<String>,
        /// Restore the server defaults
        #[arg(long)]
        reset: bool,
    },
    /// Change username and/or password
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Set an RDA value by entry id
    Rda { id: i64, value: f64 },
    /// Set an UL value by entry id
    Ul { id: i64, value: f64 },
    /// Print the local theme, or toggle it
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    //// Args setup
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());

    if !(log_enabled!(log::Level::Debug) || log_enabled!(log::Level::Trace)) {
        log::info!("Enable verbose logging for request timings");
    }

    let api: Arc<dyn DietApi> = Arc::new(
        RestClient::new(&args.base_url, args.token.as_deref())
            .context("Failed to set up the API client")?,
    );
    let settings = Arc::new(SettingsStore::new(api.clone()));
    let foods = Arc::new(FoodCatalog::new(api.clone()));

    let open = |diet: &str| DietPage::new(api.clone(), settings.clone(), foods.clone(), diet);

    match args.command {
        Cmd::Diets => {
            for name in list_diet_names(api.as_ref())
                .await
                .context("Failed to list diets")?
            {
                println!("{}", name);
            }
        }
        Cmd::Show { diet } => {
            let page = load(open(&diet)).await?;
            print!("{}", render_text(&page.view().await));
        }
        Cmd::SetQuantity {
            diet,
            row,
            quantity,
        } => {
            let page = load(open(&diet)).await?;
            page.edit_quantity(row_index(row)?, &quantity).await?;
            save_and_show(&page).await?;
        }
        Cmd::SetFood { diet, row, fdc_id } => {
            let page = load(open(&diet)).await?;
            page.select_food(row_index(row)?, fdc_id).await?;
            save_and_show(&page).await?;
        }
        Cmd::Color { diet, row, color } => {
            let page = load(open(&diet)).await?;
            page.toggle_color(row_index(row)?, swatch(&color)).await?;
            save_and_show(&page).await?;
        }
        Cmd::Reorder { diet, from, to } => {
            let page = load(open(&diet)).await?;
            page.move_row(row_index(from)?, row_index(to)?).await?;
            save_and_show(&page).await?;
        }
        Cmd::Add { diet } => {
            let page = load(open(&diet)).await?;
            page.add_item().await.context("Failed to add item")?;
            print!("{}", render_text(&page.view().await));
        }
        Cmd::Delete { diet, row } => {
            let page = load(open(&diet)).await?;
            page.delete_item(row_index(row)?)
                .await
                .context("Failed to delete item")?;
            print!("{}", render_text(&page.view().await));
        }
        Cmd::DeleteDiet { diet } => {
            let page = open(&diet);
            page.delete_diet().await.context("Failed to delete diet")?;
            println!("{}", page.status().await);
        }
        Cmd::Rename { diet, new_name } => {
            let page = open(&diet);
            page.rename_diet(&new_name)
                .await
                .context("Failed to rename diet")?;
            print!("{}", render_text(&page.view().await));
        }
        Cmd::Search { query, limit } => {
            let index = foods.ensure_loaded().await.context("Failed to load foods")?;
            let settings = settings.load().await.unwrap_or_default();
            for food in index.search(&query, limit) {
                let color = dominant_macro(food)
                    .map(|m| format!("{:?} {}", m, m.color(&settings)))
                    .unwrap_or_default();
                println!("{:>8}  {}  {}", food.fdc_id, food.name, color);
            }
        }
        Cmd::ImportFood { fdc_id } => {
            let msg = foods
                .import_from_fdc(fdc_id)
                .await
                .with_context(|| format!("Failed to import food {}", fdc_id))?;
            println!("{}", msg);
        }
        Cmd::Settings { columns, reset } => {
            let current = if reset {
                settings.reset().await.context("Failed to reset settings")?
            } else {
                settings.load().await.context("Failed to load settings")?
            };
            let current = match columns {
                Some(columns) => {
                    let mut changed = current;
                    changed.diet_columns = columns
                        .split(',')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect();
                    settings.save(changed).await.context("Failed to save settings")?
                }
                None => current,
            };
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        Cmd::Profile { username, password } => {
            settings
                .update_profile(username.as_deref(), password.as_deref())
                .await
                .context("Failed to update profile")?;
            println!("Profile updated");
        }
        Cmd::Rda { id, value } => {
            let mut refs = References::load(api.clone()).await?;
            refs.update_rda(id, value)
                .await
                .with_context(|| format!("Failed to update RDA {}", id))?;
            println!("RDA {} set to {}", id, value);
        }
        Cmd::Ul { id, value } => {
            let mut refs = References::load(api.clone()).await?;
            refs.update_ul(id, value)
                .await
                .with_context(|| format!("Failed to update UL {}", id))?;
            println!("UL {} set to {}", id, value);
        }
        Cmd::Theme { toggle } => {
            let store = LocalStore::open(&args.local_db)
                .with_context(|| format!("Failed to open {}", args.local_db))?;
            let theme = if toggle {
                store.toggle_theme()?
            } else {
                store.theme()?
            };
            println!("{}", theme.as_str());
        }
    }

    Ok(())
}

async fn load(page: DietPage) -> Result<DietPage> {
    let diet = page.diet_name().await;
    page.load()
        .await
        .with_context(|| format!("Failed to load diet {}", diet))?;
    Ok(page)
}

async fn save_and_show(page: &DietPage) -> Result<()> {
    match page.save_all().await? {
        SaveOutcome::NothingToSave => log::info!("Nothing changed"),
        outcome => log::debug!("{:?}", outcome),
    }
    page.flush().await;
    print!("{}", render_text(&page.view().await));
    Ok(())
}

fn row_index(row: usize) -> Result<usize> {
    if row == 0 {
        bail!("Rows are numbered from 1");
    }
    Ok(row - 1)
}
