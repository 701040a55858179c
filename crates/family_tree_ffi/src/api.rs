//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the family tree read/write boundary to Dart via FRB.
//! - Keep error semantics simple: envelopes with `ok` + message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Ids cross the boundary as UTF-8 UUID strings.
//! - Every call opens the store fresh; no process-wide store object exists.

use family_tree_core::db::open_db;
use family_tree_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, store_display_order,
    visible_edges, visible_members, CanvasPosition, FamilyTreeStore, HiddenSet, Member, MemberId,
    Relationship, SqliteSlotStorage, TreeStoreConfig,
};
use log::error;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const TREE_DB_FILE_NAME: &str = "family_tree.sqlite3";
static TREE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static TREE_CONFIG: OnceLock<TreeStoreConfig> = OnceLock::new();

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Applies store behavior switches from a JSON document.
///
/// # FFI contract
/// - First successful call wins; later calls return an error message.
/// - Returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_tree(config_json: String) -> String {
    let config = match TreeStoreConfig::from_json_str(config_json.as_str()) {
        Ok(config) => config,
        Err(err) => return format!("configure_tree failed: {err}"),
    };
    match TREE_CONFIG.set(config) {
        Ok(()) => String::new(),
        Err(_) => "configure_tree failed: configuration already applied".to_string(),
    }
}

/// Member row returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberItem {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub emoji: String,
    /// Role label (`Parent|Child|...|Pet|Self`).
    pub relationship: String,
    /// Peer ids in link order.
    pub connections: Vec<String>,
    /// Sum of edge weights.
    pub total_connections: u32,
    pub is_profile: bool,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeActionResponse {
    /// Whether the call reached the store.
    pub ok: bool,
    /// Whether stored state changed. Unknown ids give `ok && !changed`.
    pub changed: bool,
    /// Member id the call created or targeted.
    pub member_id: Option<String>,
    pub message: String,
}

impl TreeActionResponse {
    fn applied(changed: bool, member_id: Option<String>) -> Self {
        let message = if changed { "Updated." } else { "No change." };
        Self {
            ok: true,
            changed,
            member_id,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            member_id: None,
            message: message.into(),
        }
    }
}

/// Lists profile and members in display order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Returns an empty list when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn list_members() -> Vec<MemberItem> {
    with_tree_store(|store| {
        let store: &FamilyTreeStore<_> = store;
        store_display_order(store)
            .into_iter()
            .map(|member| to_member_item(member, store.is_profile(member.id)))
            .collect()
    })
    .unwrap_or_default()
}

/// Lists profile and members in display order, skipping hidden ids.
///
/// # FFI contract
/// - Malformed ids in `hidden_ids` are ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn list_visible_members(hidden_ids: Vec<String>) -> Vec<MemberItem> {
    let hidden = parse_hidden_set(&hidden_ids);
    with_tree_store(|store| {
        let store: &FamilyTreeStore<_> = store;
        let ordered = store_display_order(store);
        visible_members(&ordered, &hidden)
            .into_iter()
            .map(|member| to_member_item(member, store.is_profile(member.id)))
            .collect()
    })
    .unwrap_or_default()
}

/// Canvas position of one member card.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionItem {
    pub member_id: String,
    pub x: f64,
    pub y: f64,
}

/// Lists every stored canvas position.
///
/// # FFI contract
/// - Order is unspecified; members never placed are absent.
/// - Returns an empty list when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn list_positions() -> Vec<PositionItem> {
    with_tree_store(|store| {
        store
            .positions()
            .iter()
            .map(|(id, position)| PositionItem {
                member_id: id.to_string(),
                x: position.x,
                y: position.y,
            })
            .collect()
    })
    .unwrap_or_default()
}

/// One line bundle drawn between two visible members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeItem {
    pub from_id: String,
    pub to_id: String,
    /// Number of parallel lines.
    pub weight: u32,
}

/// Lists edges between members that are not hidden, one per pair.
///
/// # FFI contract
/// - Malformed ids in `hidden_ids` are ignored.
/// - Returns an empty list when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn list_visible_edges(hidden_ids: Vec<String>) -> Vec<EdgeItem> {
    let hidden = parse_hidden_set(&hidden_ids);
    with_tree_store(|store| {
        let store: &FamilyTreeStore<_> = store;
        visible_edges(store, &hidden)
            .into_iter()
            .map(|edge| EdgeItem {
                from_id: edge.from.to_string(),
                to_id: edge.to.to_string(),
                weight: u32::from(edge.weight),
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Creates a member from form input and returns its new id.
#[flutter_rust_bridge::frb(sync)]
pub fn add_member(name: String, age: u32, emoji: String, relationship: String) -> TreeActionResponse {
    let role = match parse_role(&relationship) {
        Ok(role) => role,
        Err(message) => return TreeActionResponse::failure(message),
    };
    let member = Member::new(name.trim(), age, emoji, role);
    let id = member.id.to_string();
    respond(with_tree_store(|store| store.add_member(member)), Some(id))
}

/// Replaces name, age, emoji and role of an existing member. Edges are kept.
#[flutter_rust_bridge::frb(sync)]
pub fn update_member(
    member_id: String,
    name: String,
    age: u32,
    emoji: String,
    relationship: String,
) -> TreeActionResponse {
    let id = match parse_member_id(&member_id) {
        Ok(id) => id,
        Err(message) => return TreeActionResponse::failure(message),
    };
    let role = match parse_role(&relationship) {
        Ok(role) => role,
        Err(message) => return TreeActionResponse::failure(message),
    };
    let result = with_tree_store(|store| {
        let Some(mut member) = store.members().iter().find(|m| m.id == id).cloned() else {
            return false;
        };
        member.name = name.trim().to_string();
        member.age = age;
        member.emoji = emoji;
        member.relationship = role;
        store.update_member(member)
    });
    respond(result, Some(member_id))
}

/// Deletes a member.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_member(member_id: String) -> TreeActionResponse {
    with_member_id(member_id, |store, id| store.delete_member(id))
}

/// Creates or edits the owner profile, keeping its id and edges when present.
#[flutter_rust_bridge::frb(sync)]
pub fn set_profile(name: String, age: u32, emoji: String) -> TreeActionResponse {
    let result = with_tree_store(|store| {
        let profile = match store.user_profile().cloned() {
            Some(mut existing) => {
                existing.name = name.trim().to_string();
                existing.age = age;
                existing.emoji = emoji;
                existing
            }
            None => Member::new(name.trim(), age, emoji, Relationship::SelfProfile),
        };
        let id = profile.id.to_string();
        store.set_user_profile(profile);
        id
    });
    match result {
        Ok(id) => TreeActionResponse::applied(true, Some(id)),
        Err(message) => TreeActionResponse::failure(message),
    }
}

/// Links two members or reinforces their link.
#[flutter_rust_bridge::frb(sync)]
pub fn connect_members(first_id: String, second_id: String) -> TreeActionResponse {
    with_member_pair(first_id, second_id, |store, a, b| store.connect(a, b))
}

/// Weakens the link between two members by one.
#[flutter_rust_bridge::frb(sync)]
pub fn disconnect_members(first_id: String, second_id: String) -> TreeActionResponse {
    with_member_pair(first_id, second_id, |store, a, b| store.disconnect(a, b))
}

/// Removes every line between two members.
#[flutter_rust_bridge::frb(sync)]
pub fn sever_members(first_id: String, second_id: String) -> TreeActionResponse {
    with_member_pair(first_id, second_id, |store, a, b| {
        store.remove_all_connections_between(a, b)
    })
}

/// Removes every edge of one member (hide flow).
#[flutter_rust_bridge::frb(sync)]
pub fn disconnect_all(member_id: String) -> TreeActionResponse {
    with_member_id(member_id, |store, id| store.remove_connections_for_member(id))
}

/// Edge weight between two members; 0 for unknown ids.
#[flutter_rust_bridge::frb(sync)]
pub fn connection_count(first_id: String, second_id: String) -> u32 {
    let (Ok(a), Ok(b)) = (parse_member_id(&first_id), parse_member_id(&second_id)) else {
        return 0;
    };
    with_tree_store(|store| u32::from(store.connection_count(a, b))).unwrap_or(0)
}

/// Records a member card's canvas position.
#[flutter_rust_bridge::frb(sync)]
pub fn update_position(member_id: String, x: f64, y: f64) -> TreeActionResponse {
    with_member_id(member_id, |store, id| {
        store.update_position(id, CanvasPosition::new(x, y))
    })
}

fn with_member_id(
    member_id: String,
    f: impl FnOnce(&mut FamilyTreeStore<SqliteSlotStorage<'_>>, MemberId) -> bool,
) -> TreeActionResponse {
    match parse_member_id(&member_id) {
        Ok(id) => respond(with_tree_store(|store| f(store, id)), Some(member_id)),
        Err(message) => TreeActionResponse::failure(message),
    }
}

fn with_member_pair(
    first_id: String,
    second_id: String,
    f: impl FnOnce(&mut FamilyTreeStore<SqliteSlotStorage<'_>>, MemberId, MemberId) -> bool,
) -> TreeActionResponse {
    let ids = parse_member_id(&first_id).and_then(|a| parse_member_id(&second_id).map(|b| (a, b)));
    match ids {
        Ok((a, b)) => respond(with_tree_store(|store| f(store, a, b)), Some(first_id)),
        Err(message) => TreeActionResponse::failure(message),
    }
}

fn respond(result: Result<bool, String>, member_id: Option<String>) -> TreeActionResponse {
    match result {
        Ok(changed) => TreeActionResponse::applied(changed, member_id),
        Err(message) => TreeActionResponse::failure(message),
    }
}

fn resolve_tree_db_path() -> PathBuf {
    TREE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("FAMILY_TREE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TREE_DB_FILE_NAME)
        })
        .clone()
}

fn with_tree_store<T>(
    f: impl FnOnce(&mut FamilyTreeStore<SqliteSlotStorage<'_>>) -> T,
) -> Result<T, String> {
    let db_path = resolve_tree_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        error!("event=ffi_store_open module=ffi status=error error_code=db_open_failed error={err}");
        format!("tree DB open failed: {err}")
    })?;
    let storage = SqliteSlotStorage::try_new(&conn).map_err(|err| {
        error!("event=ffi_store_open module=ffi status=error error_code=storage_init_failed error={err}");
        format!("tree storage init failed: {err}")
    })?;
    let config = TREE_CONFIG.get().cloned().unwrap_or_default();
    let mut store = FamilyTreeStore::open(storage, config);
    Ok(f(&mut store))
}

fn parse_member_id(raw: &str) -> Result<MemberId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid member id `{raw}`"))
}

fn parse_hidden_set(raw_ids: &[String]) -> HiddenSet {
    let mut hidden = HiddenSet::new();
    for id in raw_ids.iter().filter_map(|raw| parse_member_id(raw).ok()) {
        hidden.hide(id);
    }
    hidden
}

fn parse_role(raw: &str) -> Result<Relationship, String> {
    match raw.parse::<Relationship>() {
        Ok(Relationship::SelfProfile) => {
            Err("role `Self` is reserved for the owner profile".to_string())
        }
        Ok(role) => Ok(role),
        Err(err) => Err(err.to_string()),
    }
}

fn to_member_item(member: &Member, is_profile: bool) -> MemberItem {
    MemberItem {
        id: member.id.to_string(),
        name: member.name.clone(),
        age: member.age,
        emoji: member.emoji.clone(),
        relationship: member.relationship.as_str().to_string(),
        connections: member.connections().iter().map(Uuid::to_string).collect(),
        total_connections: member.total_connections(),
        is_profile,
    }
}
