use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dialstore")]
#[command(author, version, about = "Inspect and manage a chat data store", long_about = None)]
pub struct Cli {
    /// Override the configured backend (api, apiMock, browserStorage)
    #[arg(short = 's', long, global = true)]
    pub storage: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored conversations
    Conversations,

    /// List stored prompts
    Prompts,

    /// Show all user preferences
    Prefs,

    /// Change the UI theme preference
    SetTheme {
        /// dark or light
        theme: String,
    },

    /// Work with remote files
    Files {
        #[command(subcommand)]
        command: FileCommands,
    },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// List files under a folder (storage root by default)
    List {
        #[arg(short, long)]
        path: Option<String>,
    },

    /// List folders under a folder (storage root by default)
    Folders {
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Upload a local file
    Upload {
        file: String,

        /// Target folder on the server
        #[arg(short, long)]
        path: Option<String>,

        /// MIME type sent with the file
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Delete a file by its absolute path
    Rm { path: String },
}
