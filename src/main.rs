use anyhow::Result;
use clap::Parser;
use dialstore::cli::{Cli, Commands, FileCommands};
use dialstore::models::Theme;
use dialstore::{utils, DataService, Settings, StorageType, UploadEvent, UploadFile};
use futures::StreamExt;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    let cli = Cli::parse();
    if let Some(storage) = &cli.storage {
        settings.storage.storage_type = StorageType::from(storage.as_str());
    }

    let service = DataService::from_settings(&settings).await?;

    let result = match cli.command {
        Commands::Conversations => handle_conversations(&service).await,
        Commands::Prompts => handle_prompts(&service).await,
        Commands::Prefs => handle_prefs(&service).await,
        Commands::SetTheme { theme } => handle_set_theme(&service, &theme).await,
        Commands::Files { command } => handle_files(&service, command).await,
    };

    if let Err(e) = &result {
        utils::print_error(&format!("Error: {}", e));
    }
    result
}

async fn handle_conversations(service: &DataService) -> Result<()> {
    let conversations = service.get_conversations().await?;
    utils::print_header(&format!(
        "Conversations ({}, {} storage)",
        conversations.len(),
        service.backend_name()
    ));

    for conv in conversations {
        let state = if conv.is_new() {
            "new".to_string()
        } else {
            format!("{} messages", conv.messages.len())
        };
        println!("{}  {}  [{}] {}", conv.id, conv.name, conv.model.id, state);
    }
    Ok(())
}

async fn handle_prompts(service: &DataService) -> Result<()> {
    let prompts = service.get_prompts().await?;
    utils::print_header(&format!("Prompts ({})", prompts.len()));

    for prompt in prompts {
        println!("{}  {}", prompt.id, prompt.name);
    }
    Ok(())
}

async fn handle_prefs(service: &DataService) -> Result<()> {
    utils::print_header("Preferences");
    utils::print_field("storage", service.storage_type());
    utils::print_field("theme", service.get_theme().await);
    utils::print_field("showChatbar", service.get_show_chatbar().await);
    utils::print_field("showPromptbar", service.get_show_promptbar().await);
    utils::print_field(
        "selectedConversationIds",
        service.get_selected_conversations_ids().await.join(", "),
    );
    utils::print_field("recentModelsIds", service.get_recent_models_ids().await.join(", "));
    utils::print_field("recentAddonsIds", service.get_recent_addons_ids().await.join(", "));
    utils::print_field("openedFoldersIds", service.get_opened_folder_ids().await.join(", "));
    Ok(())
}

async fn handle_set_theme(service: &DataService, theme: &str) -> Result<()> {
    let theme: Theme = theme.parse().map_err(anyhow::Error::msg)?;
    service.set_theme(theme).await?;
    utils::print_success(&format!("Theme set to {}", theme));
    Ok(())
}

async fn handle_files(service: &DataService, command: FileCommands) -> Result<()> {
    match command {
        FileCommands::List { path } => {
            let files = service.get_files(path.as_deref()).await?;
            utils::print_header(&format!("Files ({})", files.len()));
            for file in files {
                println!("{}  {} bytes  {}", file.id, file.content_length, file.content_type);
            }
        }
        FileCommands::Folders { path } => {
            let folders = service.get_file_folders(path.as_deref()).await?;
            utils::print_header(&format!("Folders ({})", folders.len()));
            for folder in folders {
                println!("{}", folder.id);
            }
        }
        FileCommands::Upload {
            file,
            path,
            content_type,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let name = Path::new(&file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&file)
                .to_string();

            let mut upload = UploadFile::new(name, bytes);
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }

            let mut events = service.send_file(upload, path.as_deref());
            while let Some(event) = events.next().await {
                match event? {
                    UploadEvent::Progress { percent } => {
                        utils::print_info(&format!("Uploading... {:.0}%", percent));
                    }
                    UploadEvent::Result(uploaded) => {
                        utils::print_success(&format!("Uploaded {}", uploaded.id));
                    }
                }
            }
        }
        FileCommands::Rm { path } => {
            service.remove_file(&path).await?;
            utils::print_success(&format!("Removed {}", path));
        }
    }
    Ok(())
}
