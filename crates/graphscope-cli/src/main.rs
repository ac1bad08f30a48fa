use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use graphscope_core::{BackendKind, Config, GraphData, GraphStore};
use graphscope_engine::{QueryService, SubgraphParams};
use graphscope_store::{InMemoryGraphStore, SqliteGraphStore, SyntheticGraph};

/// GraphScope - neighborhood queries over a labeled graph
#[derive(Parser)]
#[command(name = "graphscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: graphscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show node and link counts
    Init,

    /// Search node ids (case-insensitive substring)
    Search {
        /// Search term (empty matches every node)
        #[arg(default_value = "")]
        term: String,

        /// Maximum matches (default: [search] limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Extract the neighborhood of a node as JSON
    Subgraph {
        /// Start node id
        start_node_id: String,

        /// Hops to follow along outgoing links
        #[arg(short, long, default_value = "2", allow_hyphen_values = true)]
        forward_depth: String,

        /// Hops to follow along incoming links
        #[arg(short, long, default_value = "2", allow_hyphen_values = true)]
        backward_depth: String,

        /// Links considered per expanded node
        #[arg(short, long, default_value = "4", allow_hyphen_values = true)]
        edge_limit: String,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic graph into the SQLite store or a JSON file
    Seed {
        /// Number of nodes (default: [seed] nodes)
        #[arg(long)]
        nodes: Option<usize>,

        /// Maximum links drawn per node (default: [seed] max_links_per_node)
        #[arg(long)]
        max_links: Option<usize>,

        /// RNG seed for a reproducible graph
        #[arg(long)]
        seed: Option<u64>,

        /// Write JSON here instead of the SQLite store
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the SQLite store's contents with a JSON graph
    Load {
        /// JSON file with `nodes` and `links`
        input: PathBuf,
    },

    /// Write the SQLite store's contents as JSON
    Export {
        output: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Bind address (default: [server] host)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: [server] port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Serve { .. }));

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("graphscope.toml").exists() {
        Config::from_file(Path::new("graphscope.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if cli.verbose {
        eprintln!("{} {:?} store", "Using".cyan(), config.store.backend);
    }

    match cli.command {
        Commands::Init => init_command(&config),
        Commands::Search { term, limit } => search_command(&config, &term, limit),
        Commands::Subgraph {
            start_node_id,
            forward_depth,
            backward_depth,
            edge_limit,
            output,
        } => {
            let params =
                SubgraphParams::new(start_node_id, forward_depth, backward_depth, edge_limit);
            subgraph_command(&config, &params, output.as_deref(), cli.verbose)
        }
        Commands::Seed {
            nodes,
            max_links,
            seed,
            output,
        } => seed_command(&config, nodes, max_links, seed, output.as_deref(), cli.verbose),
        Commands::Load { input } => load_command(&config, &input, cli.verbose),
        Commands::Export { output } => export_command(&config, &output, cli.verbose),
        Commands::Serve { host, port } => serve_command(&config, host, port).await,
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool, serving: bool) {
    let default_level = match (verbose, serving) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Open the configured store
fn open_store(config: &Config) -> Result<Arc<dyn GraphStore>> {
    match config.store.backend {
        BackendKind::Sqlite => {
            let store = SqliteGraphStore::open(&config.store.path)?;
            Ok(Arc::new(store))
        }
        BackendKind::Memory => {
            let graph = match &config.store.data {
                Some(path) => GraphData::from_file(path)?,
                None => SyntheticGraph::from_config(&config.seed).generate(),
            };
            Ok(Arc::new(InMemoryGraphStore::from_graph(graph)))
        }
    }
}

/// Open the SQLite store, refusing other backends
fn open_sqlite(config: &Config, command: &str) -> Result<SqliteGraphStore> {
    if config.store.backend != BackendKind::Sqlite {
        return Err(anyhow::anyhow!(
            "'{}' writes to the SQLite store, but the configured backend is {:?}. \
             Set [store] backend = \"sqlite\".",
            command,
            config.store.backend
        ));
    }

    Ok(SqliteGraphStore::open(&config.store.path)?)
}

/// Init command - node and link counts
fn init_command(config: &Config) -> Result<()> {
    let service = QueryService::from_config(open_store(config)?, config);
    let stats = service.stats()?;

    println!("{} {}", "Nodes:".bold(), stats.node_count.to_string().green());
    println!("{} {}", "Links:".bold(), stats.link_count.to_string().green());

    Ok(())
}

/// Search command - matching node ids, one per line
fn search_command(config: &Config, term: &str, limit: Option<usize>) -> Result<()> {
    let mut service = QueryService::from_config(open_store(config)?, config);
    if let Some(limit) = limit {
        service = service.with_search_limit(limit);
    }

    let ids = service.node_ids(term)?;

    if ids.is_empty() {
        eprintln!("{}", format!("No node ids match '{}'", term).yellow());
    }

    for id in ids {
        println!("{}", id);
    }

    Ok(())
}

/// Subgraph command - validated extraction printed as JSON
fn subgraph_command(
    config: &Config,
    params: &SubgraphParams,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let service = QueryService::from_config(open_store(config)?, config);

    let subgraph = match service.subgraph(params) {
        Ok(subgraph) => subgraph,
        Err(e) if e.is_validation() => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    let json = subgraph.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            if verbose {
                eprintln!("{} {}", "Subgraph saved to:".green(), path.display());
            }
        }
        None => println!("{}", json),
    }

    if verbose {
        eprintln!(
            "{} {} nodes, {} links",
            "Extracted".cyan(),
            subgraph.nodes.len(),
            subgraph.links.len()
        );
    }

    if subgraph.truncated {
        eprintln!(
            "{}",
            "⚠ Result truncated at the configured [limits] ceiling".yellow().bold()
        );
    }

    Ok(())
}

/// Seed command - synthetic graph into SQLite or a JSON file
fn seed_command(
    config: &Config,
    nodes: Option<usize>,
    max_links: Option<usize>,
    seed: Option<u64>,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let mut recipe = SyntheticGraph::from_config(&config.seed);
    if let Some(nodes) = nodes {
        recipe.node_count = nodes;
    }
    if let Some(max_links) = max_links {
        recipe.max_links_per_node = max_links;
    }
    if let Some(seed) = seed {
        recipe.seed = Some(seed);
    }

    if verbose {
        eprintln!(
            "{} {} nodes, up to {} links each",
            "Generating".cyan(),
            recipe.node_count,
            recipe.max_links_per_node
        );
    }

    let graph = recipe.generate();

    match output {
        Some(path) => {
            graph.save_to_file(path)?;
            println!("{} {}", "✓ Graph written to".green(), path.display());
        }
        None => {
            let store = open_sqlite(config, "seed")?;
            store.load(&graph)?;
            println!("{} {}", "✓ Store seeded at".green(), store.path().display());
        }
    }

    println!("  Nodes: {}", graph.nodes.len());
    println!("  Links: {}", graph.links.len());

    Ok(())
}

/// Load command - import a JSON graph into SQLite
fn load_command(config: &Config, input: &Path, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Loading graph from:".cyan(), input.display());
    }

    let graph = GraphData::from_file(input)?;
    let store = open_sqlite(config, "load")?;
    store.load(&graph)?;

    println!(
        "{} {} nodes, {} links into {}",
        "✓ Loaded".green(),
        graph.nodes.len(),
        graph.links.len(),
        store.path().display()
    );

    Ok(())
}

/// Export command - dump SQLite to a JSON graph
fn export_command(config: &Config, output: &Path, verbose: bool) -> Result<()> {
    let store = open_sqlite(config, "export")?;
    let graph = store.export()?;
    graph.save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "Exported from:".cyan(), store.path().display());
    }

    println!(
        "{} {} nodes, {} links to {}",
        "✓ Exported".green(),
        graph.nodes.len(),
        graph.links.len(),
        output.display()
    );

    Ok(())
}

/// Serve command - HTTP API
async fn serve_command(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let store = open_store(config)?;
    let service = Arc::new(QueryService::from_config(store, config));

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    graphscope_server::serve(service, &host, port).await
}
