mod code;
mod id;
mod model;
mod session;
mod store;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use model::{IssueType, MAX_VIDEO_SIZE_MB, Media, MediaKind, Report, Status};

#[derive(Parser)]
#[command(name = "bt", about = "Bugtrack — bug and feedback portal for game builds")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create .bugtrack/ in the current directory
    Init,
    /// Register an account (the first account becomes the admin)
    Register {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log out
    Logout,
    /// Show the logged-in account and its next report code
    Whoami,
    /// Submit a report
    Submit {
        #[arg(short = 't', long = "type", default_value = "bug")]
        issue_type: IssueType,
        /// Game version (defaults to the newest configured version)
        #[arg(short = 'v', long)]
        version: Option<String>,
        #[arg(short, long)]
        description: String,
        /// Path to a screenshot or video
        #[arg(short, long)]
        media: Option<String>,
    },
    /// List reports, newest first
    List {
        #[arg(short = 't', long = "type")]
        issue_type: Option<IssueType>,
        #[arg(short, long)]
        status: Option<Status>,
        /// Only my own reports
        #[arg(long)]
        mine: bool,
    },
    /// Show report details
    Show { report: String },
    /// Set a report's status (admin)
    Status { report: String, status: Status },
    /// Manage the list of game versions
    Version {
        #[command(subcommand)]
        action: VersionCmd,
    },
    /// Portal branding
    Settings {
        #[command(subcommand)]
        action: SettingsCmd,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum VersionCmd {
    /// Add a game version (admin)
    Add { version: String },
    /// Remove a game version (admin)
    Rm { version: String },
    /// List configured versions, newest first
    List,
}

#[derive(Subcommand)]
enum SettingsCmd {
    /// Show current branding
    Show,
    /// Update branding (admin)
    Set {
        #[arg(long)]
        logo_url: Option<String>,
        /// Accent color as #RRGGBB
        #[arg(long)]
        emphasis_color: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Cmd::Init => {
            store::init()?;
            println!("initialized .bugtrack/");
            Ok(())
        }
        Cmd::Register { username, password } => {
            let mut s = store::load()?;
            let user_id = store::register_user(&mut s, &username, &password)?;
            store::save(&s)?;
            session::save(&session::Session { user_id: user_id.clone() })?;
            let user = s.users.get(&user_id).ok_or("user not found after register")?;
            println!("registered {} (hex {})", user.username, user.user_hex);
            if user.is_admin {
                println!("this account has admin privileges");
            }
            Ok(())
        }
        Cmd::Login { username, password } => {
            let s = store::load()?;
            let user_id = store::login(&s, &username, &password)?;
            session::save(&session::Session { user_id })?;
            println!("logged in as {username}");
            Ok(())
        }
        Cmd::Logout => {
            session::clear()?;
            println!("logged out");
            Ok(())
        }
        Cmd::Whoami => {
            let s = store::load()?;
            let user = session::current_user(&s)?;
            println!("  User: {}", user.username);
            println!("  Hex: {}", user.user_hex);
            println!("  Admin: {}", if user.is_admin { "yes" } else { "no" });
            println!(
                "  Reports: {} of {}",
                user.submission_count,
                code::MAX_REPORTS_PER_USER
            );
            match code::counter_label(user.submission_count) {
                Some(label) => println!(
                    "  Next code: {}",
                    code::format_report_code(&user.user_hex, &label)
                ),
                None => println!("  Next code: none (report limit reached)"),
            }
            Ok(())
        }
        Cmd::Submit {
            issue_type,
            version,
            description,
            media,
        } => {
            let mut s = store::load()?;
            let user_id = session::current_user(&s)?.id.clone();
            let version = match version {
                Some(v) => v,
                None => store::latest_version(&s)
                    .ok_or("no game versions configured (an admin must run 'bt version add')")?
                    .to_string(),
            };
            let media = match media {
                Some(path) => Some(attach_media(&path)?),
                None => None,
            };
            let id = store::submit_report(&mut s, &user_id, &version, issue_type, description, media)?;
            store::save(&s)?;
            let report = s.reports.get(&id).ok_or("report not found after submit")?;
            println!("submitted {} ({})", report.report_code, report.id);
            Ok(())
        }
        Cmd::List {
            issue_type,
            status,
            mine,
        } => {
            let s = store::load()?;
            let mine_id = if mine {
                Some(session::current_user(&s)?.id.clone())
            } else {
                None
            };
            print_list_header();
            for report in store::recent_reports(&s) {
                if should_show(report, issue_type, status, mine_id.as_deref()) {
                    print_list_row(report);
                }
            }
            Ok(())
        }
        Cmd::Show { report } => {
            let s = store::load()?;
            let id = store::resolve_report(&s, &report)?;
            let report = s.reports.get(&id).ok_or("report not found")?;
            println!("  Code: {}", report.report_code);
            println!("  ID: {}", report.id);
            println!("  Reporter: {}", report.username);
            println!("  Type: {}", report.issue_type);
            println!("  Status: {}", report.status);
            println!("  Version: {}", report.version);
            println!("  Created: {}", report.created_at.format("%Y-%m-%d %H:%M"));
            println!("  Description: {}", report.description);
            if let Some(ref media) = report.media {
                println!("  Media: {} ({})", media.path, media.kind);
            }
            Ok(())
        }
        Cmd::Status { report, status } => {
            let mut s = store::load()?;
            let actor_id = session::current_user(&s)?.id.clone();
            let id = store::update_status(&mut s, &actor_id, &report, status)?;
            store::save(&s)?;
            println!("updated {id} to {status}");
            Ok(())
        }
        Cmd::Version { action } => match action {
            VersionCmd::Add { version } => {
                let mut s = store::load()?;
                let actor_id = session::current_user(&s)?.id.clone();
                store::add_version(&mut s, &actor_id, &version)?;
                store::save(&s)?;
                println!("added version {version}");
                Ok(())
            }
            VersionCmd::Rm { version } => {
                let mut s = store::load()?;
                let actor_id = session::current_user(&s)?.id.clone();
                store::remove_version(&mut s, &actor_id, &version)?;
                store::save(&s)?;
                println!("removed version {version}");
                Ok(())
            }
            VersionCmd::List => {
                let s = store::load()?;
                if s.versions.is_empty() {
                    println!("no versions configured");
                } else {
                    for version in &s.versions {
                        println!("{version}");
                    }
                }
                Ok(())
            }
        },
        Cmd::Settings { action } => match action {
            SettingsCmd::Show => {
                let s = store::load()?;
                let logo = if s.settings.logo_url.is_empty() {
                    "(none)"
                } else {
                    s.settings.logo_url.as_str()
                };
                println!("  Logo: {logo}");
                println!("  Emphasis color: {}", s.settings.emphasis_color);
                Ok(())
            }
            SettingsCmd::Set {
                logo_url,
                emphasis_color,
            } => {
                if logo_url.is_none() && emphasis_color.is_none() {
                    return Err("nothing to set (use --logo-url and/or --emphasis-color)".to_string());
                }
                let mut s = store::load()?;
                let actor_id = session::current_user(&s)?.id.clone();
                store::update_settings(&mut s, &actor_id, logo_url, emphasis_color)?;
                store::save(&s)?;
                println!("settings saved");
                Ok(())
            }
        },
        Cmd::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn attach_media(path: &str) -> Result<Media, String> {
    let kind = MediaKind::from_path(path)
        .ok_or_else(|| format!("unsupported media file '{path}' (expected an image or video)"))?;
    let meta = std::fs::metadata(path).map_err(|e| format!("cannot read media file '{path}': {e}"))?;
    if kind == MediaKind::Video && meta.len() > MAX_VIDEO_SIZE_MB * 1024 * 1024 {
        return Err(format!("video exceeds the {MAX_VIDEO_SIZE_MB}MB limit"));
    }
    Ok(Media {
        path: path.to_string(),
        kind,
    })
}

fn should_show(
    report: &Report,
    issue_type: Option<IssueType>,
    status: Option<Status>,
    mine: Option<&str>,
) -> bool {
    if let Some(t) = issue_type {
        if report.issue_type != t {
            return false;
        }
    }
    if let Some(s) = status {
        if report.status != s {
            return false;
        }
    }
    if let Some(user_id) = mine {
        if report.user_id != user_id {
            return false;
        }
    }
    true
}

fn print_list_header() {
    println!(
        "{:<14} {:<15} {:<17} {:<8} {:<12} {}",
        "CODE", "TYPE", "STATUS", "VER", "USER", "DESCRIPTION"
    );
    println!("{}", "-".repeat(88));
}

fn print_list_row(report: &Report) {
    println!(
        "{:<14} {:<15} {:<17} {:<8} {:<12} {}",
        report.report_code,
        report.issue_type,
        report.status,
        report.version,
        report.username,
        summary(&report.description, 40)
    );
}

/// First line of a description, truncated for the list view.
fn summary(description: &str, max: usize) -> String {
    let line = description.lines().next().unwrap_or("");
    if line.chars().count() <= max {
        line.to_string()
    } else {
        let mut cut: String = line.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}
