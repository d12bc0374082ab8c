//! Cache key builders for memoized results.
//!
//! A memo key is the query name plus the JSON encoding of its arguments,
//! so two calls with equal arguments share an entry. The provider adds
//! its own deployment prefix on top.

use serde::Serialize;

use canopy_core::result::AppResult;

/// Namespace for memoized query results.
const MEMO: &str = "memo";

/// Query name for the folder tree snapshot.
pub const FOLDER_TREE: &str = "folder_tree";

/// Query name for the listable-folder set of a requester.
pub const LISTABLE_FOLDERS: &str = "listable_folders";

/// Query name for the allowed-folder set of a requester and action.
pub const ALLOWED_FOLDERS: &str = "allowed_folders";

/// Cache key for a memoized query result.
pub fn memo_key<A: Serialize + ?Sized>(query: &str, args: &A) -> AppResult<String> {
    let encoded = serde_json::to_string(args)?;
    Ok(format!("{MEMO}:{query}:{encoded}"))
}
