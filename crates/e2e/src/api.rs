//! Folder listing side channel
//!
//! The vault and password-vault tables key their action menus by resource id,
//! and the UI never prints those ids. The only way to target `action-{id}`
//! controls is to ask the listing endpoint which ids the folder currently
//! holds. The fetch runs inside the page so it rides on the actor's session
//! cookies, and it is deliberately single-shot: the create action has already
//! completed by the time the listing is read.

use serde::Deserialize;

use crate::error::E2eResult;
use crate::tab::Tab;

/// Which listing API a folder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderNamespace {
    Vault,
    Pass,
}

impl FolderNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderNamespace::Vault => "vault",
            FolderNamespace::Pass => "pass",
        }
    }
}

/// One file, credential entry or subfolder in a listing. The endpoint returns
/// more fields (keys, share metadata, timestamps) than the tests consume.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Response body of `GET /api/{namespace}/folder/{folderId}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderListing {
    #[serde(default)]
    pub items: Vec<FolderEntry>,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}

/// Path of the listing endpoint. An empty `folder_id` addresses the actor's
/// root folder.
pub fn folder_path(namespace: FolderNamespace, folder_id: &str) -> String {
    format!("/api/{}/folder/{}", namespace.as_str(), folder_id)
}

/// Fetch the listing for `folder_id` from inside the page.
pub async fn fetch_folder_listing(
    tab: &Tab,
    namespace: FolderNamespace,
    folder_id: &str,
) -> E2eResult<FolderListing> {
    let path = folder_path(namespace, folder_id);
    let expr = format!(
        r#"(async () => {{
            const response = await fetch({path});
            if (!response.ok) {{
                throw new Error("listing fetch failed: " + response.status);
            }}
            return await response.json();
        }})()"#,
        path = crate::tab::js_str(&path),
    );
    tab.evaluate_json(&expr).await
}
