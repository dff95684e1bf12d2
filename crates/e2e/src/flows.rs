//! Actor flows shared by more than one suite

use tracing::info;

use crate::config::USER_PASSWORD;
use crate::error::{ensure, E2eResult};
use crate::session::Actor;
use crate::tab::Tab;

/// Create a new id-only account and return its opaque account id. Leaves the
/// actor logged in.
pub async fn signup_id_only(actor: &Actor<'_>) -> E2eResult<String> {
    let tab = actor.new_tab().await?;
    tab.goto("/signup").await?;
    tab.click("id-signup").await?;
    tab.expect_visible("create-id-only-account").await?;

    tab.fill("account-password", USER_PASSWORD).await?;
    tab.fill("account-confirm-password", USER_PASSWORD).await?;
    tab.click("create-id-only-account").await?;
    tab.expect_visible("account-id-verify").await?;

    tab.fill("account-code", "123456").await?;
    tab.click("verify-account").await?;

    let account_id = tab.text_content("final-account-id").await?;
    tab.expect_visible("goto-account").await?;
    ensure(!account_id.is_empty(), "signup produced an empty account id")?;
    info!(account_id = %account_id, "created id-only account");
    Ok(account_id)
}

/// Log in with an account id and password.
pub async fn login(tab: &Tab, account_id: &str, password: &str) -> E2eResult<()> {
    tab.goto("/login").await?;
    tab.fill("identifier", account_id).await?;
    tab.fill("password", password).await?;
    tab.click("login-btn").await?;
    Ok(())
}

/// Permanently delete the actor's account through the confirmed destructive
/// action. The account id doubles as the confirmation text for the dialog.
pub async fn delete_account(tab: &Tab, account_id: &str) -> E2eResult<()> {
    tab.goto("/account").await?;
    tab.click("advanced-summary").await?;
    tab.click("delete-btn").await?;

    tab.auto_accept_dialogs(Some(account_id)).await?;
    tab.click("delete-btn").await?;
    Ok(())
}
