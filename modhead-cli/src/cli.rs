use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Manage request profiles and the header overrides they apply")]
pub struct Cli {
    /// Path to the local storage file (overrides MODHEAD_STORAGE and the config file)
    #[clap(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Path the compiled override rules are installed to
    #[clap(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show pause state, selected profile and rule count
    Status,

    /// Manage request profiles
    #[clap(subcommand)]
    Profile(ProfileCommand),

    /// Manage header overrides of a profile
    #[clap(subcommand)]
    Header(HeaderCommand),

    /// Manage URL filters of a profile
    #[clap(subcommand)]
    Filter(FilterCommand),

    /// Suspend all header overrides
    Pause,

    /// Resume header overrides
    Resume,

    /// Flip between paused and active
    Toggle,

    /// Export all profiles as JSON
    Export {
        /// Write to a file instead of stdout
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        /// Copy the export to the clipboard
        #[clap(long)]
        clipboard: bool,
    },

    /// Import profiles from a JSON export
    Import {
        /// File produced by `export`
        file: PathBuf,
    },

    /// Import profiles exported by the third-party header extension
    ImportExtension {
        /// Exported profiles file
        file: PathBuf,
    },

    /// Print the installed override rules as JSON
    Rules,

    /// Show how the current rules rewrite a request
    Apply {
        /// Request URL
        #[clap(long)]
        url: String,

        /// Original request header as "Name: Value" (repeatable)
        #[clap(long = "header", short = 'H')]
        headers: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Create a new profile and select it
    Add {
        /// Name of the profile
        name: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// List all profiles
    List,

    /// Show a profile's headers and URL filters (defaults to the selected profile)
    Show {
        /// Profile id or name
        profile: Option<String>,
    },

    /// Rename a profile
    Rename {
        /// Profile id or name
        profile: String,

        /// New name
        name: String,
    },

    /// Delete a profile
    Remove {
        /// Profile id or name
        profile: String,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Select a profile
    Select {
        /// Profile id or name
        profile: String,
    },

    /// Enable a profile
    Enable {
        /// Profile id or name
        profile: String,
    },

    /// Disable a profile
    Disable {
        /// Profile id or name
        profile: String,
    },

    /// Move a profile to a new position (1-based)
    Move {
        /// Profile id or name
        profile: String,

        /// Target position
        position: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum HeaderCommand {
    /// Add a header override; an empty value removes the header from requests
    Add {
        /// Header name
        name: String,

        /// Header value
        #[clap(default_value = "")]
        value: String,

        /// Profile id or name (defaults to the selected profile)
        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Remove a header override by its position (1-based)
    Remove {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Enable a header override
    Enable {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Disable a header override
    Disable {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Restrict a profile to URLs matching a pattern
    Add {
        /// URL filter ("*" wildcard, "|" and "||" anchors)
        pattern: String,

        /// Profile id or name (defaults to the selected profile)
        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Remove a URL filter by its position (1-based)
    Remove {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Enable a URL filter
    Enable {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },

    /// Disable a URL filter
    Disable {
        index: usize,

        #[clap(long, short = 'p')]
        profile: Option<String>,
    },
}
