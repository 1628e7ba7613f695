//! backchannel: terminal front end for the search and chat screens.
//! Reads config, runs a search from the command line or a chat session over
//! stdin, and prints answers, citations and replies to stdout.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use backchannel_client::{
    config, ChatOutcome, ChatScreen, Config, QueryClient, RevealController, SearchOutcome,
    SearchResult, SearchScreen,
};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backchannel", version, about = "Search and chat with the backchannel answer service")]
struct Cli {
    /// Config file (defaults to ~/.backchannel/config.yaml)
    #[arg(long, env = "BACKCHANNEL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the answer with its sources
    Search {
        /// Ask the service for a more elaborate answer
        #[arg(long)]
        deep: bool,
        /// Print the answer one character at a time
        #[arg(long)]
        reveal: bool,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Chat over stdin, one message per line
    Chat {
        #[arg(long)]
        deep: bool,
        /// Let the service search the web before replying
        #[arg(long)]
        search: bool,
    },
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    config::default_config_path().unwrap_or_else(|| {
        eprintln!("Error: unable to determine config path (set --config or BACKCHANNEL_CONFIG)");
        process::exit(1);
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    let cfg = match config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config from {}: {}", config_path.display(), e);
            process::exit(1);
        }
    };

    let client = match cfg.client_settings().map_err(|e| e.to_string()).and_then(|settings| {
        QueryClient::new(settings).map_err(|e| e.to_string())
    }) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    let code = rt.block_on(async {
        match cli.command {
            Command::Search {
                deep,
                reveal,
                query,
            } => run_search(&cfg, client, &query.join(" "), deep, reveal).await,
            Command::Chat { deep, search } => run_chat(client, deep, search).await,
        }
    });
    process::exit(code);
}

async fn run_search(cfg: &Config, client: QueryClient, query: &str, deep: bool, reveal: bool) -> i32 {
    let screen = SearchScreen::new(client);
    screen.set_deep_analysis(deep);

    let response = match screen.submit(query).await {
        SearchOutcome::Fetched(r) | SearchOutcome::Cached(r) => r,
        SearchOutcome::Ignored => {
            eprintln!("Error: no query provided");
            return 1;
        }
        SearchOutcome::Failed { message } => {
            eprintln!("{}", message);
            return 1;
        }
        SearchOutcome::Superseded => return 1,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if reveal {
        let mut controller = RevealController::new(cfg.reveal_tick());
        let mut frames = controller.start(response.answer.clone());
        let mut shown = 0;
        while let Some(prefix) = frames.recv().await {
            let _ = write!(out, "{}", &prefix[shown..]);
            let _ = out.flush();
            shown = prefix.len();
        }
        let _ = writeln!(out);
    } else {
        let _ = writeln!(out, "{}", response.answer);
    }
    print_results(&mut out, &response.search_results);
    0
}

fn print_results(out: &mut impl Write, results: &[SearchResult]) {
    if results.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nSources:");
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", i + 1, result.title);
        let _ = writeln!(out, "    {}", result.href);
        if !result.body.is_empty() {
            let _ = writeln!(out, "    {}", result.body);
        }
    }
}

async fn run_chat(client: QueryClient, deep: bool, use_search: bool) -> i32 {
    let screen = ChatScreen::new(client);
    screen.set_deep_analysis(deep);
    screen.set_use_search(use_search);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error: failed to read stdin: {}", e);
                return 1;
            }
        };
        match screen.send(&line).await {
            ChatOutcome::Replied(reply) => println!("{}", reply),
            ChatOutcome::Failed { message } => println!("{}", message),
            ChatOutcome::Ignored | ChatOutcome::Superseded => {}
        }
    }
    0
}
