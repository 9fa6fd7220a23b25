use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use todo_app::config::Config;
use todo_app::daemon;
use todo_app::error::Result;
use todo_app::todo::{validate_text, TodoItem, TodoStats, TodoStore};
use todo_app::ui::{progress_label, COMPLETED_MARKER, EMPTY_LIST_MESSAGE};

#[derive(Parser, Debug)]
#[command(name = "todo-app")]
#[command(about = "Single-user todo list backed by a JSON file")]
struct Cli {
    #[arg(long, env = "TODO_APP_DATA_FILE")]
    data_file: Option<String>,

    #[arg(long, help = "JSON config file")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the web UI (default)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
    List,
    Add {
        text: String,
    },
    Toggle {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,todo_app=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let data_file = config.resolve_data_file(cli.data_file.as_deref());

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });
    match command {
        Commands::Serve { host, port } => serve(&config, host.as_deref(), port, &data_file).await,
        command => run_command(&TodoStore::new(&data_file), command).await,
    }
}

async fn serve(
    config: &Config,
    host: Option<&str>,
    port: Option<u16>,
    data_file: &str,
) -> Result<()> {
    let host = config.resolve_host(host);
    let port = config.resolve_port(port);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    daemon::run_with_shutdown(&host, port, data_file, shutdown).await
}

/// Runs one store operation and prints the resulting list.
async fn run_command(store: &TodoStore, command: Commands) -> Result<()> {
    match command {
        Commands::Serve { .. } | Commands::List => {}
        Commands::Add { text } => {
            let text = match validate_text(&text) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("{}", style(err.to_string()).red());
                    std::process::exit(2);
                }
            };
            let item = store.add(text).await?;
            println!("{}", style(format!("Added: {}", item.text)).green());
        }
        Commands::Toggle { id } => {
            store.toggle(id).await?;
        }
        Commands::Delete { id } => {
            store.delete(id).await?;
        }
    }

    print_list(&store.list().await?);
    Ok(())
}

fn print_list(items: &[TodoItem]) {
    if items.is_empty() {
        println!("{}", style(EMPTY_LIST_MESSAGE).dim());
        return;
    }
    for item in items {
        let id = style(format!("{:>4}", item.id)).cyan();
        if item.completed {
            println!("{id}  {} {COMPLETED_MARKER}", style(&item.text).dim());
        } else {
            println!("{id}  {}", item.text);
        }
    }
    let stats = TodoStats::from_items(items);
    println!();
    println!("{} {}", style("Progress").bold(), progress_label(stats));
}
