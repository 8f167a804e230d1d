//! protgraph CLI: load, query and maintain a protein similarity graph
//!
//! Opens the data directory directly; stop the HTTP server before running
//! commands that write.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use protgraph::config::AppConfig;
use protgraph::docstore::{AnnotationCriteria, AnnotationValues, LengthCriteria, SearchCriteria};
use protgraph::engine::HopLevel;
use protgraph::ingest;
use protgraph::{PersistentGraph, ProteinId, ProteinService, RawProteinRecord, RocksDocumentStore, Session};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "protgraph", version, about = "Protein domain-similarity graph CLI")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "PROTGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory, overrides the configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a tab-separated UniProt export (optionally gzipped) and link it into the graph
    Load {
        /// Path to the table
        path: PathBuf,

        /// Records per commit
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Add or update one protein
    Add {
        /// Accession
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Protein names, UniProt style
        #[arg(long)]
        names: Option<String>,
        #[arg(long)]
        organism: Option<String>,
        #[arg(long)]
        sequence: Option<String>,
        /// Semicolon-separated EC numbers
        #[arg(long)]
        ec: Option<String>,
        /// Semicolon-separated InterPro ids
        #[arg(long)]
        interpro: Option<String>,
    },
    /// Delete a protein and its similarity edges
    Delete { id: String },
    /// Show the weighted two-hop neighborhood of a protein
    Neighbors {
        id: String,
        /// Direct neighbors kept
        #[arg(short, long)]
        k: Option<usize>,
        /// Second-hop neighbors kept per direct neighbor
        #[arg(short, long)]
        m: Option<usize>,
    },
    /// Search proteins
    Search {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        organism: Option<String>,
        #[arg(long)]
        sequence: Option<String>,
        /// EC list `a,b` or expression `(a AND b) OR (c)`
        #[arg(long)]
        ec: Option<String>,
        /// InterPro list `a,b` or expression `(a AND b) OR (c)`
        #[arg(long)]
        interpro: Option<String>,
        /// How list values combine: AND or OR
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        min_length: Option<usize>,
        #[arg(long)]
        max_length: Option<usize>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },
    /// Corpus statistics
    Stats,
    /// Delete every protein, document and edge
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

type Service = ProteinService<PersistentGraph, RocksDocumentStore>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    tracing_subscriber::fmt()
        .with_max_level(config.level()?)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Reset { yes: false } = cli.command {
        bail!("reset deletes all data; pass --yes to confirm");
    }

    let session = Session::open(&config.storage.data_dir)
        .with_context(|| format!("opening data directory {:?}", config.storage.data_dir))?;
    let mut settings = config.graph.clone();
    if let Commands::Load { batch_size: Some(size), .. } = &cli.command {
        settings.batch_size = *size;
    }
    let mut service = ProteinService::new(session.open_graph()?, session.documents(), settings);

    run(&mut service, cli.command, &cli.format)?;

    drop(service);
    session.close()?;
    Ok(())
}

fn run(service: &mut Service, command: Commands, format: &OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Load { path, .. } => {
            let table = ingest::read_file(&path)?;
            let report = service.load(&table.records)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => {
                    println!("Records:   {} ({} unreadable rows)", report.records, table.skipped);
                    println!("Invalid:   {}", report.invalid);
                    println!("Documents: {}", report.documents);
                    println!("Nodes:     {}", report.graph.nodes);
                    println!("Edges:     {}", report.graph.edges);
                    println!("Batches:   {}", report.graph.batches);
                }
            }
        }
        Commands::Add {
            id,
            name,
            names,
            organism,
            sequence,
            ec,
            interpro,
        } => {
            let record = RawProteinRecord {
                id: Some(id),
                display_name: name,
                protein_names: names,
                organism,
                sequence,
                ec_numbers: ec,
                interpro,
            };
            let report = service.add_protein(&record)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => {
                    println!("Protein:   {}", report.id);
                    println!("Document:  {}", phase(report.documents.success, &report.documents.error));
                    println!("Graph:     {}", phase(report.graph.success, &report.graph.error));
                    if !report.graph.relations.is_empty() {
                        let mut table = new_table(&["Target", "Weight", "Shared domains"]);
                        for relation in &report.graph.relations {
                            table.add_row(vec![
                                relation.target.to_string(),
                                format!("{:.4}", relation.weight),
                                relation.shared_domains.join(", "),
                            ]);
                        }
                        println!("{}", table);
                    }
                    println!("{} similar protein(s)", report.graph.similar_count);
                }
            }
        }
        Commands::Delete { id } => {
            let report = service.remove_protein(&ProteinId::new(id))?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => {
                    println!("Protein:   {}", report.id);
                    println!("Document:  {}", if report.document_deleted { "deleted" } else { "absent" });
                    println!("Node:      {}", if report.node_deleted { "deleted" } else { "absent" });
                    println!("Relations: {}", report.relations_deleted);
                    for error in &report.errors {
                        eprintln!("Error: {}", error);
                    }
                }
            }
        }
        Commands::Neighbors { id, k, m } => {
            let id = ProteinId::new(id);
            let Some(subgraph) = service.neighborhood(&id, k, m)? else {
                bail!("Protein not found: {}", id);
            };
            match format {
                OutputFormat::Json => print_json(&subgraph)?,
                OutputFormat::Table => {
                    let mut table = new_table(&["Id", "Name", "Organism", "Group", "Similarity"]);
                    for node in &subgraph.nodes {
                        table.add_row(vec![
                            node.protein.id.to_string(),
                            node.protein.display_name.clone(),
                            node.protein.organism.clone(),
                            group_name(node.group).to_string(),
                            format!("{:.4}", node.similarity),
                        ]);
                    }
                    println!("{}", table);
                    println!("{} node(s), {} edge(s)", subgraph.nodes.len(), subgraph.edges.len());
                }
            }
        }
        Commands::Search {
            keyword,
            organism,
            sequence,
            ec,
            interpro,
            mode,
            min_length,
            max_length,
            page,
            per_page,
        } => {
            let annotation = |values: Option<String>| {
                values.map(|values| AnnotationCriteria {
                    values: AnnotationValues::Text(values),
                    mode: mode.clone(),
                })
            };
            let criteria = SearchCriteria {
                keyword,
                organism,
                sequence,
                ec: annotation(ec),
                interpro: annotation(interpro),
                length: (min_length.is_some() || max_length.is_some()).then_some(LengthCriteria {
                    min: min_length,
                    max: max_length,
                }),
            };
            let results = service.search(&criteria, page, per_page)?;
            match format {
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Table => {
                    if results.results.is_empty() {
                        println!("(no results)");
                        return Ok(());
                    }
                    let mut table = new_table(&["Id", "Name", "Organism", "Length", "EC", "InterPro"]);
                    for protein in &results.results {
                        table.add_row(vec![
                            protein.id.to_string(),
                            protein.display_name.clone(),
                            protein.organism.clone(),
                            protein.sequence_length.to_string(),
                            protein.enzyme_codes.join(", "),
                            protein.domain_ids.join(", "),
                        ]);
                    }
                    println!("{}", table);
                    println!(
                        "page {} ({} per page), {} match(es)",
                        results.page, results.per_page, results.total_matches
                    );
                }
            }
        }
        Commands::Stats => {
            let stats = service.stats()?;
            match format {
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Table => {
                    println!("Proteins:   {}", stats.total_proteins);
                    println!("Labelled:   {} ({:.1}%)", stats.labelled_proteins, stats.labelled_ratio);
                    println!("Unlabelled: {}", stats.unlabelled_proteins);
                    println!("Isolated:   {} ({:.1}%)", stats.isolated_proteins, stats.isolated_ratio);
                    println!("Edges:      {}", stats.total_edges);
                }
            }
        }
        Commands::Reset { .. } => {
            service.reset()?;
            println!("Reset complete");
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn phase(success: bool, error: &Option<String>) -> String {
    match (success, error) {
        (true, _) => "ok".to_string(),
        (false, Some(e)) => format!("failed: {}", e),
        (false, None) => "failed".to_string(),
    }
}

fn group_name(group: HopLevel) -> &'static str {
    match group {
        HopLevel::Center => "center",
        HopLevel::Level1 => "level1",
        HopLevel::Level2 => "level2",
    }
}
