use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_VIDEO_SIZE_MB: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    CriticalError,
    Proposal,
    Suggestion,
    Other,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Bug => write!(f, "bug"),
            IssueType::CriticalError => write!(f, "critical-error"),
            IssueType::Proposal => write!(f, "proposal"),
            IssueType::Suggestion => write!(f, "suggestion"),
            IssueType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bug" => Ok(IssueType::Bug),
            "critical-error" | "critical_error" | "critical" => Ok(IssueType::CriticalError),
            "proposal" => Ok(IssueType::Proposal),
            "suggestion" => Ok(IssueType::Suggestion),
            "other" => Ok(IssueType::Other),
            _ => Err(format!("unknown issue type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InReview,
    Fixed,
    NotReproducible,
    Accepted,
    Rejected,
    Read,
}

impl Status {
    /// Statuses an admin may assign to a report of the given type.
    pub fn options_for(issue_type: IssueType) -> &'static [Status] {
        match issue_type {
            IssueType::Bug | IssueType::CriticalError => &[
                Status::Pending,
                Status::InReview,
                Status::Fixed,
                Status::NotReproducible,
            ],
            IssueType::Proposal | IssueType::Suggestion => &[
                Status::Pending,
                Status::InReview,
                Status::Accepted,
                Status::Rejected,
            ],
            IssueType::Other => &[Status::Pending, Status::Read, Status::InReview],
        }
    }

    pub fn allowed_for(self, issue_type: IssueType) -> bool {
        Status::options_for(issue_type).contains(&self)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::InReview => write!(f, "in-review"),
            Status::Fixed => write!(f, "fixed"),
            Status::NotReproducible => write!(f, "not-reproducible"),
            Status::Accepted => write!(f, "accepted"),
            Status::Rejected => write!(f, "rejected"),
            Status::Read => write!(f, "read"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(Status::Pending),
            "in-review" => Ok(Status::InReview),
            "fixed" => Ok(Status::Fixed),
            "not-reproducible" => Ok(Status::NotReproducible),
            "accepted" => Ok(Status::Accepted),
            "rejected" => Ok(Status::Rejected),
            "read" => Ok(Status::Read),
            _ => Err(format!("unknown status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Infer the kind from a file extension. Unknown extensions are rejected
    /// rather than guessed.
    pub fn from_path(path: &str) -> Option<MediaKind> {
        let ext = path.rsplit_once('.').map(|(_, e)| e.to_lowercase())?;
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" => Some(MediaKind::Image),
            "mp4" | "webm" | "mov" | "mkv" | "avi" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub path: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub user_hex: String,
    pub submission_count: u32,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub version: String,
    pub issue_type: IssueType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    pub report_code: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub logo_url: String,
    pub emphasis_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            logo_url: String::new(),
            emphasis_color: "#6366F1".to_string(),
        }
    }
}

/// `#RRGGBB`, the only color form the settings accept.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Store {
    pub users: BTreeMap<String, User>,
    pub reports: BTreeMap<String, Report>,
    pub versions: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_type_from_str_valid() {
        assert_eq!("bug".parse::<IssueType>().unwrap(), IssueType::Bug);
        assert_eq!(
            "critical-error".parse::<IssueType>().unwrap(),
            IssueType::CriticalError
        );
        assert_eq!("proposal".parse::<IssueType>().unwrap(), IssueType::Proposal);
        assert_eq!("suggestion".parse::<IssueType>().unwrap(), IssueType::Suggestion);
        assert_eq!("other".parse::<IssueType>().unwrap(), IssueType::Other);
    }

    #[test]
    fn issue_type_from_str_case_insensitive() {
        assert_eq!("BUG".parse::<IssueType>().unwrap(), IssueType::Bug);
        assert_eq!("Critical".parse::<IssueType>().unwrap(), IssueType::CriticalError);
    }

    #[test]
    fn issue_type_from_str_invalid() {
        assert!("epic".parse::<IssueType>().is_err());
        assert!("".parse::<IssueType>().is_err());
    }

    #[test]
    fn display_round_trip_issue_type() {
        for variant in [
            IssueType::Bug,
            IssueType::CriticalError,
            IssueType::Proposal,
            IssueType::Suggestion,
            IssueType::Other,
        ] {
            let s = variant.to_string();
            assert_eq!(s.parse::<IssueType>().unwrap(), variant);
        }
    }

    #[test]
    fn display_round_trip_status() {
        for variant in [
            Status::Pending,
            Status::InReview,
            Status::Fixed,
            Status::NotReproducible,
            Status::Accepted,
            Status::Rejected,
            Status::Read,
        ] {
            let s = variant.to_string();
            assert_eq!(s.parse::<Status>().unwrap(), variant);
        }
    }

    #[test]
    fn status_from_str_accepts_underscores() {
        assert_eq!("in_review".parse::<Status>().unwrap(), Status::InReview);
        assert_eq!("not_reproducible".parse::<Status>().unwrap(), Status::NotReproducible);
    }

    #[test]
    fn status_options_depend_on_type() {
        assert!(Status::Fixed.allowed_for(IssueType::Bug));
        assert!(Status::Fixed.allowed_for(IssueType::CriticalError));
        assert!(!Status::Fixed.allowed_for(IssueType::Proposal));
        assert!(Status::Accepted.allowed_for(IssueType::Suggestion));
        assert!(!Status::Accepted.allowed_for(IssueType::Bug));
        assert!(Status::Read.allowed_for(IssueType::Other));
        assert!(!Status::Read.allowed_for(IssueType::Bug));
        // pending and in-review are legal everywhere
        for t in [
            IssueType::Bug,
            IssueType::CriticalError,
            IssueType::Proposal,
            IssueType::Suggestion,
            IssueType::Other,
        ] {
            assert!(Status::Pending.allowed_for(t));
            assert!(Status::InReview.allowed_for(t));
        }
    }

    #[test]
    fn media_kind_from_path() {
        assert_eq!(MediaKind::from_path("shot.png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path("clips/crash.MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path("notes.txt"), None);
        assert_eq!(MediaKind::from_path("no-extension"), None);
    }

    #[test]
    fn hex_color_validation() {
        assert!(is_hex_color("#6366F1"));
        assert!(is_hex_color("#000000"));
        assert!(is_hex_color("#abcdef"));
        assert!(!is_hex_color("6366F1"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#GGGGGG"));
        assert!(!is_hex_color(""));
    }

    #[test]
    fn store_serde_round_trip() {
        let now = Utc::now();
        let mut store = Store::default();
        store.users.insert(
            "us-ab12".to_string(),
            User {
                id: "us-ab12".to_string(),
                username: "alex".to_string(),
                password_hash: "deadbeef".to_string(),
                user_hex: "1F2E3E".to_string(),
                submission_count: 3,
                is_admin: false,
            },
        );
        store.reports.insert(
            "rp-cd34".to_string(),
            Report {
                id: "rp-cd34".to_string(),
                user_id: "us-ab12".to_string(),
                username: "alex".to_string(),
                version: "1.2.5".to_string(),
                issue_type: IssueType::Bug,
                description: "Crash on load".to_string(),
                media: Some(Media {
                    path: "crash.png".to_string(),
                    kind: MediaKind::Image,
                }),
                report_code: "CI-1F2E3E-D".to_string(),
                status: Status::Pending,
                created_at: now,
            },
        );
        store.versions.push("1.2.5".to_string());

        let json = serde_json::to_string(&store).unwrap();
        let restored: Store = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.users.len(), 1);
        assert_eq!(restored.users["us-ab12"].user_hex, "1F2E3E");
        assert_eq!(restored.reports["rp-cd34"].report_code, "CI-1F2E3E-D");
        assert_eq!(restored.versions, vec!["1.2.5".to_string()]);
        assert_eq!(restored.settings, Settings::default());
    }

    #[test]
    fn report_media_none_skipped_in_json() {
        let now = Utc::now();
        let report = Report {
            id: "rp-test".to_string(),
            user_id: "us-test".to_string(),
            username: "alex".to_string(),
            version: "1.0".to_string(),
            issue_type: IssueType::Suggestion,
            description: "More save slots".to_string(),
            media: None,
            report_code: "CI-1F2E3E-A".to_string(),
            status: Status::Pending,
            created_at: now,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("media"));
    }
}
