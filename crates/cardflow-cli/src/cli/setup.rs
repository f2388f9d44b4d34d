use cardflow::model::SortKey;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cardflow",
    bin_name = "cardflow",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Browse a folder of markdown notes as cards", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory for persisted settings and history
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub state_dir: Option<PathBuf>,

    /// Engine configuration file (cardflow.toml)
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a directory and index its cards
    #[command(display_order = 1)]
    Open {
        /// Directory of markdown documents
        dir: PathBuf,
    },

    /// List the cards of the open directory, grouped by column
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Case-insensitive search over title, preview and tags
        #[arg(short, long)]
        search: Option<String>,

        /// Only cards carrying this tag (repeatable, all must match)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Sort key: title, created, updated or size
        #[arg(long, default_value_t = SortKey::Title)]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Viewport width in pixels used to compute columns
        #[arg(long, value_name = "PX")]
        width: Option<u32>,
    },

    /// Show tag counts
    #[command(display_order = 3)]
    Tags {
        /// Include tags beyond the featured ones
        #[arg(long)]
        all: bool,
    },

    /// Show a card with its content
    #[command(alias = "v", display_order = 4)]
    Show {
        /// Card path, absolute or relative to the open directory
        path: String,
    },

    /// Create a card in the open directory
    #[command(alias = "n", display_order = 5)]
    New {
        /// File name (".md" is appended when missing)
        name: String,
    },

    /// Delete a card
    #[command(display_order = 6)]
    Rm {
        /// Card path, absolute or relative to the open directory
        path: String,
    },

    /// Recently opened directories
    #[command(display_order = 7)]
    Recent {
        /// Forget all recent directories
        #[arg(long)]
        clear: bool,

        /// Reopen the entry at this position (1 is the most recent)
        #[arg(long, value_name = "N", conflicts_with = "clear")]
        open: Option<usize>,
    },

    /// Show or change display settings
    #[command(display_order = 8)]
    Settings {
        #[command(subcommand)]
        action: Option<SettingsCommands>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Set one setting (e.g. `cardWidth 320`, `timezone UTC+9`)
    Set { key: String, value: String },

    /// Restore all defaults
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_open_takes_directory() {
        let cli = parse(&["cardflow", "open", "/notes"]);
        assert!(matches!(cli.command, Commands::Open { dir } if dir == PathBuf::from("/notes")));
    }

    #[test]
    fn test_list_defaults() {
        match parse(&["cardflow", "list"]).command {
            Commands::List {
                search,
                tags,
                sort,
                desc,
                width,
            } => {
                assert!(search.is_none());
                assert!(tags.is_empty());
                assert_eq!(sort, SortKey::Title);
                assert!(!desc);
                assert!(width.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_list_with_filters() {
        let cli = parse(&[
            "cardflow", "ls", "-s", "kyoto", "-t", "travel", "--tag", "japan", "--sort",
            "created", "--desc", "--width", "900",
        ]);
        match cli.command {
            Commands::List {
                search,
                tags,
                sort,
                desc,
                width,
            } => {
                assert_eq!(search.as_deref(), Some("kyoto"));
                assert_eq!(tags, vec!["travel", "japan"]);
                assert_eq!(sort, SortKey::Created);
                assert!(desc);
                assert_eq!(width, Some(900));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_sort_key_is_rejected() {
        assert!(Cli::try_parse_from(["cardflow", "list", "--sort", "mood"]).is_err());
    }

    #[test]
    fn test_settings_subcommands() {
        let cli = parse(&["cardflow", "settings", "set", "cardWidth", "320"]);
        assert!(matches!(
            cli.command,
            Commands::Settings {
                action: Some(SettingsCommands::Set { ref key, ref value })
            } if key == "cardWidth" && value == "320"
        ));
        let cli = parse(&["cardflow", "settings"]);
        assert!(matches!(cli.command, Commands::Settings { action: None }));
        let cli = parse(&["cardflow", "settings", "reset"]);
        assert!(matches!(
            cli.command,
            Commands::Settings {
                action: Some(SettingsCommands::Reset)
            }
        ));
    }

    #[test]
    fn test_recent_flags_conflict() {
        assert!(Cli::try_parse_from(["cardflow", "recent", "--clear", "--open", "1"]).is_err());
        let cli = parse(&["cardflow", "recent", "--open", "2"]);
        assert!(matches!(
            cli.command,
            Commands::Recent {
                clear: false,
                open: Some(2)
            }
        ));
    }

    #[test]
    fn test_global_options_anywhere() {
        let cli = parse(&["cardflow", "tags", "--all", "--state-dir", "/tmp/s", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/s")));
    }
}
