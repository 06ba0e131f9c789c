use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use symdex::config::Settings;
use symdex::semantic::{
    EmbeddingProvider, JsonVectorStore, SymbolEmbeddingHandler, SymbolSimilarityCalculator,
};
use symdex::{
    GraphBuilder, IndexLoader, IndexSourceResolver, SearchResponse, SourceResolver,
    SubgraphDirection, SymbolGraph, SymbolRank, SymbolRankConfig, SymbolSearch, debug_event,
    log_event,
};

#[derive(Parser)]
#[command(name = "symdex", version)]
#[command(about = "Symbol graph, SymbolRank and semantic search over SCIP indexes")]
struct Cli {
    /// SCIP index to load (overrides config and SYMDEX_INDEX__INDEX_PATH)
    #[arg(short, long, global = true)]
    index: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .symdex/settings.toml in the current directory
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Print node and edge counts of the symbol graph
    Stats,

    /// Every occurrence of a symbol, grouped by file
    References { uri: String },

    /// Potential callers and callees of a symbol
    Calls { uri: String },

    /// Source text of a symbol
    Source { uri: String },

    /// Literal substring search over module text
    Exact { pattern: String },

    /// SymbolRank with uniform personalization
    Rank {
        /// Number of results to print
        #[arg(short, long, default_value_t = 20)]
        top: usize,

        /// Only rank symbols under this dotted path
        #[arg(long)]
        filter: Option<String>,
    },

    /// Embed the source of every rankable symbol into the vector store
    Embed,

    /// Rank symbols against a free-text query
    Search {
        query: String,

        #[arg(short, long, default_value_t = 20)]
        top: usize,
    },

    /// Run a raw `type:<kind> <text>` query
    Query { text: String },
}

/// Everything loaded from one index snapshot.
struct Workspace {
    graph: Arc<SymbolGraph>,
    resolver: Arc<IndexSourceResolver>,
}

impl Workspace {
    fn load(settings: &Settings) -> Result<Self> {
        let path = &settings.index.index_path;
        let index = IndexLoader::load(path)
            .with_context(|| format!("failed to load index {}", path.display()))?;

        let resolver = Arc::new(match &settings.index.project_root {
            Some(root) => IndexSourceResolver::with_project_root(&index, Some(root.as_path())),
            None => IndexSourceResolver::from_index(&index),
        });

        let builder = GraphBuilder::new(&index);
        let graph = if settings.index.build_caller_relations {
            builder.with_caller_relations(resolver.as_ref()).build()?
        } else {
            builder.build()?
        };
        log_event!(
            "cli",
            "loaded",
            "{} symbols in {} files",
            graph.symbol_count(),
            graph.file_count()
        );

        Ok(Self {
            graph: Arc::new(graph),
            resolver,
        })
    }

    fn search(&self, settings: &Settings) -> Result<SymbolSearch> {
        let provider = embedding_provider(settings)?;
        let store = JsonVectorStore::open(&settings.semantic.embeddings_path)?;
        let handler = Arc::new(SymbolEmbeddingHandler::new(
            Box::new(store),
            Arc::clone(&provider),
        ));
        let similarity = SymbolSimilarityCalculator::new(provider, settings.semantic.norm);
        let rank_config = SymbolRankConfig::try_from(&settings.rank)?;
        let resolver: Arc<dyn SourceResolver> = self.resolver.clone();

        Ok(SymbolSearch::new(
            Arc::clone(&self.graph),
            resolver,
            rank_config,
            handler,
            similarity,
        )
        .with_z_score_power(settings.semantic.z_score_power))
    }
}

#[cfg(feature = "fastembed")]
fn embedding_provider(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = symdex::semantic::FastEmbedProvider::from_name(&settings.semantic.model)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "fastembed"))]
fn embedding_provider(_settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(NoEmbeddings))
}

/// Stands in when the binary is built without an embedding backend.
#[cfg(not(feature = "fastembed"))]
struct NoEmbeddings;

#[cfg(not(feature = "fastembed"))]
impl EmbeddingProvider for NoEmbeddings {
    fn build_vector(&self, _text: &str) -> symdex::semantic::EmbeddingResult<Vec<f32>> {
        Err(symdex::EmbeddingError::Provider(
            "symdex was built without the `fastembed` feature".to_string(),
        ))
    }
}

fn print_ranking(ranked: &[(symdex::Symbol, f64)], top: usize) {
    for (position, (symbol, score)) in ranked.iter().take(top).enumerate() {
        println!("{:>4}. {score:.6}  {}", position + 1, symbol.dotpath());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });
    if let Some(index) = cli.index {
        settings.index.index_path = index;
    }
    symdex::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let cwd = std::env::current_dir()?;
            let path = Settings::init_config_file(&cwd, force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Stats => {
            let workspace = Workspace::load(&settings)?;
            let stats = workspace.graph.stats();
            println!("files:          {}", stats.files);
            println!("symbols:        {}", stats.symbols);
            println!("contains:       {}", stats.contains);
            println!("relationships:  {}", stats.relationships);
            println!("references:     {}", stats.references);
            println!("caller pairs:   {}", stats.caller_pairs);
        }

        Commands::References { uri } => {
            let workspace = Workspace::load(&settings)?;
            for (path, references) in workspace.search(&settings)?.references(&uri)? {
                println!("{path}");
                for reference in references {
                    println!("  {}:{}", reference.line + 1, reference.column + 1);
                }
            }
        }

        Commands::Calls { uri } => {
            let workspace = Workspace::load(&settings)?;
            let search = workspace.search(&settings)?;
            println!("callers:");
            for symbol in search.callers(&uri)? {
                println!("  {}", symbol.dotpath());
            }
            println!("callees:");
            for symbol in search.callees(&uri)? {
                println!("  {}", symbol.dotpath());
            }
        }

        Commands::Source { uri } => {
            let workspace = Workspace::load(&settings)?;
            match workspace.search(&settings)?.source(&uri)? {
                Some(text) => println!("{text}"),
                None => eprintln!("No source found for {uri}"),
            }
        }

        Commands::Exact { pattern } => {
            let workspace = Workspace::load(&settings)?;
            for (path, lines) in workspace.search(&settings)?.exact_search(&pattern)? {
                for line in lines {
                    println!("{path}:{line}");
                }
            }
        }

        Commands::Rank { top, filter } => {
            let workspace = Workspace::load(&settings)?;
            let resolver: Arc<dyn SourceResolver> = workspace.resolver.clone();
            let navigator = symdex::GraphNavigator::new(Arc::clone(&workspace.graph), resolver);
            let subgraph =
                navigator.rankable_subgraph(SubgraphDirection::default(), filter.as_deref());
            let rank = SymbolRank::new(&subgraph, SymbolRankConfig::try_from(&settings.rank)?);
            print_ranking(&rank.rank(None)?, top);
        }

        Commands::Embed => {
            let workspace = Workspace::load(&settings)?;
            let provider = embedding_provider(&settings)?;
            let store = JsonVectorStore::open(&settings.semantic.embeddings_path)?;
            let handler = SymbolEmbeddingHandler::new(Box::new(store), provider);

            let navigator = symdex::GraphNavigator::new(
                Arc::clone(&workspace.graph),
                workspace.resolver.clone(),
            );
            let mut items = Vec::new();
            for symbol in navigator.rankable_symbols(None) {
                match workspace.resolver.source(&symbol)? {
                    Some(source) => items.push((symbol, source.text)),
                    None => debug_event!("cli", "no source", "{symbol}"),
                }
            }

            let updates = handler.process_batch(&items)?;
            handler.flush()?;
            println!(
                "Processed {} symbols ({} stored) into {}",
                updates.len(),
                handler.len(),
                settings.semantic.embeddings_path.display()
            );
        }

        Commands::Search { query, top } => {
            let workspace = Workspace::load(&settings)?;
            let ranked = workspace
                .search(&settings)?
                .symbol_rank_search_top(&query, top)?;
            print_ranking(&ranked, top);
        }

        Commands::Query { text } => {
            let workspace = Workspace::load(&settings)?;
            match workspace.search(&settings)?.dispatch(&text)? {
                SearchResponse::References(grouped) => {
                    for (path, references) in grouped {
                        for reference in references {
                            println!("{path}:{}:{}", reference.line + 1, reference.column + 1);
                        }
                    }
                }
                SearchResponse::Ranking(ranked) => print_ranking(&ranked, ranked.len()),
                SearchResponse::Exact(matches) => {
                    for (path, lines) in matches {
                        for line in lines {
                            println!("{path}:{line}");
                        }
                    }
                }
                SearchResponse::Source(Some(text)) => println!("{text}"),
                SearchResponse::Source(None) => eprintln!("No source found"),
            }
        }
    }

    Ok(())
}
