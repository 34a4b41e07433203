//! `walltaker fetch`.

use std::path::Path;

use colored::Colorize;

use crate::cli::output::{format_bool, print_highlighted_json};
use crate::config;
use crate::error::WalltakerError;
use crate::feed::{Classification, FeedClient, FeedEndpoint, classify};

/// Fetches a feed once and prints the assignment.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the request fails.
pub fn execute(config_path: Option<&Path>, feed: Option<u64>) -> Result<(), WalltakerError> {
    let (config, _) = config::resolve(config_path)?;
    let feed = feed.unwrap_or(config.feed.feed);

    let client = FeedClient::new(FeedEndpoint::new(config.base.base))?;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let assignment = runtime.block_on(client.fetch(feed))?;

    print_highlighted_json(&serde_json::to_value(&assignment)?);
    println!();

    match classify(assignment) {
        Classification::Actionable(item) => {
            println!("{} {}", "Wallpaper:".bold(), item.media_url());
            println!("{} {}", "Set by:".bold(), item.attribution().unwrap_or("anonymous"));
            println!("{} {}", "Assigned:".bold(), format_bool(true));
        }
        Classification::NoAssignment { id } => {
            println!("{} {}", "Assigned:".bold(), format_bool(false));
            println!("Feed {id} has no wallpaper yet.");
        }
    }

    Ok(())
}
