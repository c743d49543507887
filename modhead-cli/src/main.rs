mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::Path;

use modhead_core::{
    apply_rules, App, Config, Event, FileStorage, HeaderOverride, ImportSource,
    JsonRulesInstaller, NotificationVariant, RequestProfile, UrlFilter,
};

use crate::cli::{Cli, Command, FilterCommand, HeaderCommand, ProfileCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_default()?;
    init_logging(cli.log_level.as_deref().or(config.log_level.as_deref()));

    let storage_path = match &cli.storage {
        Some(path) => path.clone(),
        None => config.storage_path()?,
    };
    let rules_path = match &cli.rules {
        Some(path) => path.clone(),
        None => config.rules_path()?,
    };
    log::debug!("storage {:?}, rules {:?}", storage_path, rules_path);

    let mut app = App::bootstrap(
        Box::new(FileStorage::new(&storage_path)),
        Box::new(JsonRulesInstaller::new(&rules_path)),
    )
    .with_context(|| format!("Failed to load state from {:?}", storage_path))?;

    let result = run_command(&mut app, &cli.command, &storage_path, &rules_path);

    // Whatever the command reported is shown once, then cleared
    let reported_error = render_notification(&mut app)?;
    match result {
        Err(e) if reported_error => {
            log::debug!("{:#}", e);
            std::process::exit(1);
        }
        other => other,
    }
}

fn init_logging(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("warn"));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

fn run_command(
    app: &mut App,
    command: &Command,
    storage_path: &Path,
    rules_path: &Path,
) -> Result<()> {
    match command {
        Command::Status => show_status(app, storage_path, rules_path),
        Command::Profile(cmd) => handle_profile_command(app, cmd),
        Command::Header(cmd) => handle_header_command(app, cmd),
        Command::Filter(cmd) => handle_filter_command(app, cmd),
        Command::Pause => set_paused(app, true),
        Command::Resume => set_paused(app, false),
        Command::Toggle => {
            app.dispatch(Event::ToggleIsPaused)?;
            let message = pause_message(app);
            app.notify(message, NotificationVariant::Default)
        }
        Command::Export { output, clipboard } => {
            export_profiles(app, output.as_deref(), *clipboard)
        }
        Command::Import { file } => import_profiles(app, file, ImportSource::Profiles),
        Command::ImportExtension { file } => import_profiles(app, file, ImportSource::Extension),
        Command::Rules => show_installed_rules(rules_path),
        Command::Apply { url, headers } => apply_to_request(app, url, headers),
    }
}

/// Prints the pending notification and clears it; returns true for an error
fn render_notification(app: &mut App) -> Result<bool> {
    let Some(info) = app.state().notification.clone() else {
        return Ok(false);
    };

    let is_error = info.variant.is_error();
    match info.variant {
        _ if is_error => eprintln!("{}", info.message.red()),
        NotificationVariant::ImportProfileSuccess => println!("{}", info.message.green()),
        _ => println!("{}", info.message),
    }
    app.dispatch(Event::NotificationCleared)?;
    Ok(is_error)
}

/// Prints the rule document bootstrap installed for the current state
fn show_installed_rules(rules_path: &Path) -> Result<()> {
    let installer = JsonRulesInstaller::new(rules_path);
    let document = installer.load()?;
    log::info!(
        "{} rules in {:?}, generated {}",
        document.rules.len(),
        installer.path(),
        document.generated_at
    );
    println!("{}", serde_json::to_string_pretty(&document.rules)?);
    Ok(())
}

fn show_status(app: &App, storage_path: &Path, rules_path: &Path) -> Result<()> {
    let state = app.state();

    let pause = if state.is_paused.is_paused() {
        "Paused".yellow()
    } else {
        "Active".green()
    };
    println!("{} {}", "Overrides:".bold(), pause);
    println!("{} {}", "Profiles:".bold(), state.profiles.len());

    let selected = match (&state.selected_profile_id, state.selected_profile()) {
        (_, Some(profile)) => format!("{} ({})", profile.name, profile.id),
        (Some(id), None) => format!("missing profile {}", id).red().to_string(),
        (None, None) => "(none)".dimmed().to_string(),
    };
    println!("{} {}", "Selected:".bold(), selected);
    println!("{} {}", "Active rules:".bold(), app.rules().len());
    println!("{} {}", "Storage:".bold(), storage_path.display());
    println!("{} {}", "Rules file:".bold(), rules_path.display());

    Ok(())
}

/// Handle profile management subcommands
fn handle_profile_command(app: &mut App, cmd: &ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Add { name, interactive } => {
            let profile = match name {
                Some(name) if !*interactive => RequestProfile::new(name.trim()),
                _ => crate::prompts::prompt_new_profile()?,
            };
            if profile.name.is_empty() {
                anyhow::bail!("Profile name must not be empty");
            }
            let name = profile.name.clone();
            app.dispatch(Event::ProfileCreated(profile))?;
            app.notify(
                format!("Profile '{}' created and selected", name),
                NotificationVariant::Default,
            )
        }
        ProfileCommand::List => {
            list_profiles(app);
            Ok(())
        }
        ProfileCommand::Show { profile } => {
            let id = resolve_profile_id(app, profile.as_deref())?;
            show_profile(app, &id)
        }
        ProfileCommand::Rename { profile, name } => {
            let id = resolve_profile_id(app, Some(profile.as_str()))?;
            app.dispatch(Event::ProfileRenamed {
                id,
                name: name.trim().to_string(),
            })?;
            app.notify(
                format!("Profile renamed to '{}'", name.trim()),
                NotificationVariant::Default,
            )
        }
        ProfileCommand::Remove { profile, yes } => {
            let id = resolve_profile_id(app, Some(profile.as_str()))?;
            let target = app
                .state()
                .profile(&id)
                .cloned()
                .context("Profile not found")?;

            if !*yes && !crate::prompts::confirm_remove(&target)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }

            app.dispatch(Event::ProfileRemoved(id))?;
            app.notify(
                format!("Profile '{}' deleted", target.name),
                NotificationVariant::Default,
            )
        }
        ProfileCommand::Select { profile } => {
            let id = resolve_profile_id(app, Some(profile.as_str()))?;
            app.dispatch(Event::SelectedRequestProfileIdChanged(id))?;
            let name = app
                .state()
                .selected_profile()
                .map(|p| p.name.clone())
                .unwrap_or_default();
            app.notify(format!("Selected profile '{}'", name), NotificationVariant::Default)
        }
        ProfileCommand::Enable { profile } => set_profile_enabled(app, profile, true),
        ProfileCommand::Disable { profile } => set_profile_enabled(app, profile, false),
        ProfileCommand::Move { profile, position } => {
            let id = resolve_profile_id(app, Some(profile.as_str()))?;
            app.dispatch(Event::ProfileMoved {
                id,
                to: to_index(*position)?,
            })?;
            list_profiles(app);
            Ok(())
        }
    }
}

fn set_profile_enabled(app: &mut App, profile: &str, enabled: bool) -> Result<()> {
    let id = resolve_profile_id(app, Some(profile))?;
    app.dispatch(Event::ProfileEnabledChanged { id, enabled })?;
    let verb = if enabled { "enabled" } else { "disabled" };
    app.notify(format!("Profile {}", verb), NotificationVariant::Default)
}

fn list_profiles(app: &App) {
    let state = app.state();
    if state.profiles.is_empty() {
        println!(
            "{}",
            "No profiles yet. Create one with `modhead profile add <name>`.".yellow()
        );
        return;
    }

    for (position, profile) in state.profiles.iter().enumerate() {
        let marker = if state.selected_profile_id.as_deref() == Some(profile.id.as_str()) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let name = if profile.enabled {
            profile.name.bold()
        } else {
            profile.name.dimmed()
        };
        println!(
            "{} {}. {} {} - {} header(s), {} filter(s){}",
            marker,
            position + 1,
            name,
            format!("[{}]", profile.id).dimmed(),
            profile.headers.len(),
            profile.url_filters.len(),
            if profile.enabled { "" } else { " (disabled)" }
        );
    }
}

fn show_profile(app: &App, id: &str) -> Result<()> {
    let profile = app.state().profile(id).context("Profile not found")?;

    println!("{} {}", "Profile:".bold(), profile.name);
    println!("{} {}", "ID:".bold(), profile.id);
    println!(
        "{} {}",
        "Enabled:".bold(),
        if profile.enabled { "yes".green() } else { "no".red() }
    );

    println!("{}", "Headers:".bold());
    if profile.headers.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (i, header) in profile.headers.iter().enumerate() {
        let line = if header.value.is_empty() {
            format!("{} (removed)", header.name)
        } else {
            format!("{}: {}", header.name, header.value)
        };
        let line = if header.enabled { line.normal() } else { line.dimmed() };
        println!("  {}. {}", i + 1, line);
    }

    println!("{}", "URL filters:".bold());
    if profile.url_filters.is_empty() {
        println!("  {}", "(all URLs)".dimmed());
    }
    for (i, filter) in profile.url_filters.iter().enumerate() {
        let line = if filter.enabled {
            filter.pattern.normal()
        } else {
            filter.pattern.dimmed()
        };
        println!("  {}. {}", i + 1, line);
    }

    Ok(())
}

/// Handle header override subcommands
fn handle_header_command(app: &mut App, cmd: &HeaderCommand) -> Result<()> {
    match cmd {
        HeaderCommand::Add {
            name,
            value,
            profile,
        } => {
            let profile_id = resolve_profile_id(app, profile.as_deref())?;
            if name.trim().is_empty() {
                anyhow::bail!("Header name must not be empty");
            }
            app.dispatch(Event::HeaderAdded {
                profile_id,
                header: HeaderOverride::new(name.trim(), value.clone()),
            })?;
            app.notify(format!("Header '{}' added", name.trim()), NotificationVariant::Default)
        }
        HeaderCommand::Remove { index, profile } => {
            let profile_id = resolve_profile_id(app, profile.as_deref())?;
            app.dispatch(Event::HeaderRemoved {
                profile_id,
                index: to_index(*index)?,
            })?;
            app.notify("Header removed", NotificationVariant::Default)
        }
        HeaderCommand::Enable { index, profile } => {
            set_header_enabled(app, *index, profile.as_deref(), true)
        }
        HeaderCommand::Disable { index, profile } => {
            set_header_enabled(app, *index, profile.as_deref(), false)
        }
    }
}

fn set_header_enabled(
    app: &mut App,
    index: usize,
    profile: Option<&str>,
    enabled: bool,
) -> Result<()> {
    let profile_id = resolve_profile_id(app, profile)?;
    app.dispatch(Event::HeaderEnabledChanged {
        profile_id,
        index: to_index(index)?,
        enabled,
    })?;
    let verb = if enabled { "enabled" } else { "disabled" };
    app.notify(format!("Header {}", verb), NotificationVariant::Default)
}

/// Handle URL filter subcommands
fn handle_filter_command(app: &mut App, cmd: &FilterCommand) -> Result<()> {
    match cmd {
        FilterCommand::Add { pattern, profile } => {
            let profile_id = resolve_profile_id(app, profile.as_deref())?;
            if pattern.trim().is_empty() {
                anyhow::bail!("URL filter must not be empty");
            }
            app.dispatch(Event::UrlFilterAdded {
                profile_id,
                filter: UrlFilter::new(pattern.trim()),
            })?;
            app.notify(
                format!("URL filter '{}' added", pattern.trim()),
                NotificationVariant::Default,
            )
        }
        FilterCommand::Remove { index, profile } => {
            let profile_id = resolve_profile_id(app, profile.as_deref())?;
            app.dispatch(Event::UrlFilterRemoved {
                profile_id,
                index: to_index(*index)?,
            })?;
            app.notify("URL filter removed", NotificationVariant::Default)
        }
        FilterCommand::Enable { index, profile } => {
            set_filter_enabled(app, *index, profile.as_deref(), true)
        }
        FilterCommand::Disable { index, profile } => {
            set_filter_enabled(app, *index, profile.as_deref(), false)
        }
    }
}

fn set_filter_enabled(
    app: &mut App,
    index: usize,
    profile: Option<&str>,
    enabled: bool,
) -> Result<()> {
    let profile_id = resolve_profile_id(app, profile)?;
    app.dispatch(Event::UrlFilterEnabledChanged {
        profile_id,
        index: to_index(index)?,
        enabled,
    })?;
    let verb = if enabled { "enabled" } else { "disabled" };
    app.notify(format!("URL filter {}", verb), NotificationVariant::Default)
}

fn set_paused(app: &mut App, paused: bool) -> Result<()> {
    if app.state().is_paused.is_paused() != paused {
        app.dispatch(Event::ToggleIsPaused)?;
    }
    let message = pause_message(app);
    app.notify(message, NotificationVariant::Default)
}

fn pause_message(app: &App) -> String {
    if app.state().is_paused.is_paused() {
        "Header overrides are paused".to_string()
    } else {
        format!("Header overrides are active ({} rules)", app.rules().len())
    }
}

fn export_profiles(app: &mut App, output: Option<&Path>, clipboard: bool) -> Result<()> {
    // Mirrors the export dialog: open, export, close
    app.dispatch(Event::ExportModalOpened)?;
    let json = app.export_json()?;
    let count = app.state().profiles.len();

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            app.notify(
                format!("Exported {} profile(s) to {}", count, path.display()),
                NotificationVariant::Default,
            )?;
        }
        None if !clipboard => println!("{}", json),
        None => {}
    }

    if clipboard && copy_to_clipboard(&json) {
        app.notify(
            format!("Copied {} profile(s) to the clipboard", count),
            NotificationVariant::Default,
        )?;
    }

    app.dispatch(Event::ExportModalClosed)
}

/// Clipboard failures are logged and otherwise ignored
fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string())) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to copy to clipboard: {}", e);
            false
        }
    }
}

fn import_profiles(app: &mut App, file: &Path, source: ImportSource) -> Result<()> {
    let (opened, closed) = match source {
        ImportSource::Profiles => (Event::ImportModalOpened, Event::ImportModalClosed),
        ImportSource::Extension => (
            Event::ImportFromExtensionModalOpened,
            Event::ImportFromExtensionModalClosed,
        ),
    };

    app.dispatch(opened)?;
    let result = app.import_file(file, source);
    app.dispatch(closed)?;
    result.map(|_| ())
}

fn apply_to_request(app: &App, url: &str, raw_headers: &[String]) -> Result<()> {
    let headers = raw_headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<Result<Vec<_>>>()?;

    if app.state().is_paused.is_paused() {
        println!("{}", "Overrides are paused; the request is sent unmodified.".yellow());
    }

    let rewritten = apply_rules(&app.rules(), url, &headers);
    if rewritten.is_empty() {
        println!("{}", "(no headers)".dimmed());
    }
    for (name, value) in rewritten {
        let changed = !headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case(&name) && *v == value);
        let line = format!("{}: {}", name, value);
        if changed {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Invalid header '{}': expected \"Name: Value\"", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Resolves a profile by id or name, or the selected profile when none is given
fn resolve_profile_id(app: &App, profile: Option<&str>) -> Result<String> {
    let state = app.state();
    match profile {
        Some(key) => state
            .find_profile(key)
            .map(|p| p.id.clone())
            .with_context(|| format!("Profile not found: {}", key)),
        None => state
            .selected_profile()
            .map(|p| p.id.clone())
            .context("No profile selected. Pass --profile or run `modhead profile select <name>`."),
    }
}

/// Converts a 1-based position from the command line
fn to_index(position: usize) -> Result<usize> {
    if position == 0 {
        anyhow::bail!("Positions start at 1");
    }
    Ok(position - 1)
}
