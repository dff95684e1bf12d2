//! Password-vault scenarios: credential entries and folders under `/pass`,
//! with ids resolved through the pass listing endpoint.
//!
//! Run with a YeetFile instance up:
//! `cargo test --package yeetfile-e2e --test pass_vault`

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use yeetfile_e2e::api::{self, FolderNamespace};
use yeetfile_e2e::{ensure, flows, Actor, Config, E2eResult, Session, Suite, Tab};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    match rt.block_on(run(config)) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("fatal: {err}");
            std::process::exit(2);
        }
    }
}

async fn run(config: Config) -> E2eResult<i32> {
    if !Session::preflight(&config).await? {
        return Ok(0);
    }

    let session = Session::launch(&config, 1).await?;
    let mut suite = Suite::new("pass_vault");
    {
        let actor = session.actor(0)?;

        let account_id = suite.run("signup", flows::signup_id_only(&actor)).await;
        suite.run("pass_entry", pass_entry(&actor)).await;
        suite.run("pass_folder", pass_folder(&actor)).await;

        match account_id.as_deref() {
            Some(id) => {
                suite.run("delete_account", delete_account(&actor, id)).await;
            }
            None => suite.skip("delete_account", "no account id from signup"),
        }
    }

    if let Err(err) = session.close().await {
        warn!(%err, "browser did not shut down cleanly");
    }
    Ok(suite.finish(&config.artifacts))
}

/// Create a credential entry through the entry dialog and wait for it to
/// appear in the table.
async fn create_entry(tab: &Tab, entry_name: &str) -> E2eResult<()> {
    tab.click("new-pass-entry").await?;
    tab.expect_visible("pass-entry-dialog").await?;
    tab.fill("entry-name", entry_name).await?;
    tab.fill("entry-username", "yeet@example.com").await?;
    tab.fill("entry-password", "entry-password-1").await?;
    tab.click("submit-entry").await?;
    tab.expect_link(entry_name).await
}

/// Create one credential entry in the pass root, resolve its id through the
/// listing and delete it through the confirmed action.
async fn pass_entry(actor: &Actor<'_>) -> E2eResult<()> {
    let entry_name = "Demo Login";
    let tab = actor.new_tab().await?;
    tab.goto("/pass").await?;
    create_entry(&tab, entry_name).await?;

    let listing = api::fetch_folder_listing(&tab, FolderNamespace::Pass, "").await?;
    ensure(
        listing.items.len() == 1,
        format!("expected one entry, listing has {}", listing.items.len()),
    )?;
    let entry_id = listing.items[0].id.clone();

    tab.click(&format!("action-{entry_id}")).await?;
    tab.expect_visible("actions-dialog").await?;
    tab.auto_accept_dialogs(None).await?;
    tab.click("action-delete").await?;
    tab.expect_empty("table-body").await?;

    let listing = api::fetch_folder_listing(&tab, FolderNamespace::Pass, "").await?;
    ensure(
        listing.items.is_empty(),
        format!("expected no entries, listing has {}", listing.items.len()),
    )
}

/// Create a pass folder, open it and nest a credential entry inside it.
async fn pass_folder(actor: &Actor<'_>) -> E2eResult<()> {
    let folder_name = "Logins";
    let tab = actor.new_tab().await?;
    tab.goto("/pass").await?;

    tab.click("new-vault-folder").await?;
    tab.expect_visible("folder-dialog").await?;
    tab.fill("folder-name", folder_name).await?;
    tab.click("submit-folder").await?;
    tab.expect_link(folder_name).await?;

    let listing = api::fetch_folder_listing(&tab, FolderNamespace::Pass, "").await?;
    ensure(
        listing.folders.len() == 1,
        format!("expected one folder, listing has {}", listing.folders.len()),
    )?;
    let folder_id = listing.folders[0].id.clone();

    tab.click(&format!("load-item-{folder_id}")).await?;
    create_entry(&tab, "Nested Login").await?;

    let listing = api::fetch_folder_listing(&tab, FolderNamespace::Pass, &folder_id).await?;
    ensure(
        listing.items.len() == 1,
        format!("expected one nested entry, listing has {}", listing.items.len()),
    )
}

/// Permanently delete the test account.
async fn delete_account(actor: &Actor<'_>, account_id: &str) -> E2eResult<()> {
    let tab = actor.new_tab().await?;
    flows::delete_account(&tab, account_id).await?;
    tab.expect_title("YeetFile - Send").await
}
