use crate::code::{counter_label, format_report_code, user_hex};
use crate::id::generate_id;
use crate::model::*;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const STORE_DIR: &str = ".bugtrack";
const STORE_FILENAME: &str = "store.json";

pub fn from_json(json: &str) -> Result<Store, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid store JSON: {e}"))
}

pub fn to_json(store: &Store) -> Result<String, String> {
    serde_json::to_string_pretty(store).map_err(|e| format!("failed to serialize store: {e}"))
}

fn store_path() -> PathBuf {
    Path::new(STORE_DIR).join(STORE_FILENAME)
}

pub fn init() -> Result<(), String> {
    if Path::new(STORE_DIR).exists() {
        return Err(format!("{STORE_DIR}/ already exists"));
    }
    fs::create_dir_all(STORE_DIR).map_err(|e| format!("failed to create {STORE_DIR}/: {e}"))?;
    save(&Store::default())
}

pub fn load() -> Result<Store, String> {
    let data = fs::read_to_string(store_path())
        .map_err(|e| format!("cannot read {STORE_DIR}/{STORE_FILENAME}: {e} (run 'bt init' first)"))?;
    from_json(&data)
}

pub fn save(store: &Store) -> Result<(), String> {
    let json = to_json(store)?;
    fs::write(store_path(), json)
        .map_err(|e| format!("failed to write {STORE_DIR}/{STORE_FILENAME}: {e}"))
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// --- Accounts ---

pub fn find_user_by_name<'a>(store: &'a Store, username: &str) -> Option<&'a User> {
    store.users.values().find(|u| u.username == username)
}

/// Register an account. The user hex is derived from the username once, here,
/// and never changes. The first account becomes the admin.
pub fn register_user(store: &mut Store, username: &str, password: &str) -> Result<String, String> {
    if username.trim().is_empty() {
        return Err("username must not be empty".to_string());
    }
    if password.is_empty() {
        return Err("password must not be empty".to_string());
    }
    if find_user_by_name(store, username).is_some() {
        return Err(format!("username '{username}' is already taken"));
    }

    let existing: Vec<&str> = store.users.keys().map(|s| s.as_str()).collect();
    let id = generate_id("us", username, &existing);
    let user = User {
        id: id.clone(),
        username: username.to_string(),
        password_hash: hash_password(password),
        user_hex: user_hex(username),
        submission_count: 0,
        is_admin: store.users.is_empty(),
    };
    store.users.insert(id.clone(), user);
    Ok(id)
}

/// Check credentials and return the user id. The error does not say whether
/// the username or the password was wrong.
pub fn login(store: &Store, username: &str, password: &str) -> Result<String, String> {
    let user = find_user_by_name(store, username).ok_or("invalid credentials")?;
    if user.password_hash != hash_password(password) {
        return Err("invalid credentials".to_string());
    }
    Ok(user.id.clone())
}

fn require_admin<'a>(store: &'a Store, actor_id: &str) -> Result<&'a User, String> {
    let actor = store
        .users
        .get(actor_id)
        .ok_or_else(|| format!("user '{actor_id}' not found"))?;
    if !actor.is_admin {
        return Err("admin privileges required".to_string());
    }
    Ok(actor)
}

// --- Reports ---

/// Submit a report for the given user.
///
/// The report code is derived from the user's current submission count; the
/// count is incremented in the same mutation so the next submission cannot
/// reuse the label. A `None` from `counter_label` means the account's 260
/// code slots are used up and the submission is refused.
pub fn submit_report(
    store: &mut Store,
    user_id: &str,
    version: &str,
    issue_type: IssueType,
    description: String,
    media: Option<Media>,
) -> Result<String, String> {
    let user = store
        .users
        .get(user_id)
        .ok_or_else(|| format!("user '{user_id}' not found"))?;

    if description.trim().is_empty() {
        return Err("description must not be empty".to_string());
    }
    if !store.versions.iter().any(|v| v == version) {
        return Err(format!(
            "unknown game version '{version}' (see 'bt version list')"
        ));
    }

    let label = counter_label(user.submission_count)
        .ok_or("report limit reached (Z9): this account has no codes left")?;
    let report_code = format_report_code(&user.user_hex, &label);

    let existing: Vec<&str> = store.reports.keys().map(|s| s.as_str()).collect();
    let id = generate_id("rp", &description, &existing);
    let report = Report {
        id: id.clone(),
        user_id: user.id.clone(),
        username: user.username.clone(),
        version: version.to_string(),
        issue_type,
        description,
        media,
        report_code,
        status: Status::Pending,
        created_at: Utc::now(),
    };
    store.reports.insert(id.clone(), report);
    store
        .users
        .get_mut(user_id)
        .ok_or("user vanished during submit")?
        .submission_count += 1;

    Ok(id)
}

/// Resolve a report id or report code, allowing unique prefixes of either.
pub fn resolve_report(store: &Store, query: &str) -> Result<String, String> {
    if store.reports.contains_key(query) {
        return Ok(query.to_string());
    }
    let code_query = query.to_uppercase();
    if let Some(report) = store.reports.values().find(|r| r.report_code == code_query) {
        return Ok(report.id.clone());
    }

    let matches: Vec<&str> = store
        .reports
        .values()
        .filter(|r| r.id.starts_with(query) || r.report_code.starts_with(&code_query))
        .map(|r| r.id.as_str())
        .collect();
    match matches.len() {
        0 => Err(format!("no report matching '{query}'")),
        1 => Ok(matches[0].to_string()),
        n => Err(format!(
            "ambiguous query '{query}' matches {n} reports: {}",
            matches.join(", ")
        )),
    }
}

/// Admin-only status change; the new status must be legal for the report's type.
pub fn update_status(
    store: &mut Store,
    actor_id: &str,
    query: &str,
    status: Status,
) -> Result<String, String> {
    require_admin(store, actor_id)?;
    let id = resolve_report(store, query)?;
    let report = store
        .reports
        .get_mut(&id)
        .ok_or_else(|| format!("report '{id}' not found"))?;
    if !status.allowed_for(report.issue_type) {
        let options: Vec<String> = Status::options_for(report.issue_type)
            .iter()
            .map(|s| s.to_string())
            .collect();
        return Err(format!(
            "status '{status}' is not valid for a {} report (valid: {})",
            report.issue_type,
            options.join(", ")
        ));
    }
    report.status = status;
    Ok(id)
}

/// All reports, newest first.
pub fn recent_reports(store: &Store) -> Vec<&Report> {
    let mut reports: Vec<&Report> = store.reports.values().collect();
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    reports
}

// --- Game versions ---

pub fn add_version(store: &mut Store, actor_id: &str, version: &str) -> Result<(), String> {
    require_admin(store, actor_id)?;
    if version.trim().is_empty() {
        return Err("version must not be empty".to_string());
    }
    if store.versions.iter().any(|v| v == version) {
        return Err(format!("version '{version}' already exists"));
    }
    store.versions.push(version.to_string());
    // newest first, the order the submit form offers them in
    store.versions.sort_by(|a, b| b.cmp(a));
    Ok(())
}

pub fn remove_version(store: &mut Store, actor_id: &str, version: &str) -> Result<(), String> {
    require_admin(store, actor_id)?;
    let before = store.versions.len();
    store.versions.retain(|v| v != version);
    if store.versions.len() == before {
        return Err(format!("no version '{version}'"));
    }
    Ok(())
}

pub fn latest_version(store: &Store) -> Option<&str> {
    store.versions.first().map(|s| s.as_str())
}

// --- Settings ---

pub fn update_settings(
    store: &mut Store,
    actor_id: &str,
    logo_url: Option<String>,
    emphasis_color: Option<String>,
) -> Result<(), String> {
    require_admin(store, actor_id)?;
    if let Some(color) = emphasis_color {
        if !is_hex_color(&color) {
            return Err(format!("invalid color '{color}' (expected #RRGGBB)"));
        }
        store.settings.emphasis_color = color.to_uppercase();
    }
    if let Some(url) = logo_url {
        store.settings.logo_url = url;
    }
    Ok(())
}
