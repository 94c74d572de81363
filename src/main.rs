use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use kulliyat::corpus::{CorpusStore, RawSegment};
use kulliyat::pipeline;
use kulliyat::validate::{content, integrity, schema, IntegrityReport};

#[derive(Parser)]
#[command(name = "kulliyat", about = "Corpus ingestion, addressing and integrity tooling")]
struct Cli {
    /// Corpus root directory (contains manifest.json)
    #[arg(short, long, default_value = "corpus")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run raw segments through normalize → classify → glue merge and emit blocks
    Ingest {
        /// JSON file holding an array of raw segments
        input: PathBuf,
        /// Book the segments belong to
        #[arg(long)]
        book: String,
        /// Section UID the segments belong to
        #[arg(long)]
        section: String,
        /// Write blocks here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Cross-check manifest, book, section and page files
    ValidateIntegrity,
    /// Flag segmentation regressions in persisted pages
    ValidateContent {
        /// Scan a single book
        #[arg(long, conflicts_with = "all")]
        book: Option<String>,
        /// Scan every book in the manifest
        #[arg(long)]
        all: bool,
        /// Exit 1 if any critical issue is found
        #[arg(long)]
        ci: bool,
        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,
        /// Print every flagged section
        #[arg(long)]
        verbose: bool,
        /// Report artifact path
        #[arg(long, default_value = "FLAGGED_SECTIONS.json")]
        out: PathBuf,
    },
    /// Enforce the segment-type enum and per-type shape rules
    ValidateSchema,
    /// Corpus overview
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Ingest {
            input,
            book,
            section,
            out,
        } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("cannot read {:?}", input))?;
            let segments: Vec<RawSegment> = serde_json::from_str(&raw)
                .with_context(|| format!("{:?} is not valid JSON", input))?;
            let blocks = pipeline::ingest_segments(&book, &section, &segments);
            let json = serde_json::to_string_pretty(&blocks)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {} block(s) to {}", blocks.len(), path.display());
                }
                None => println!("{json}"),
            }
            0
        }
        Commands::ValidateIntegrity => {
            let store = CorpusStore::open(&cli.root)?;
            run_integrity(&store)
        }
        Commands::ValidateContent {
            book,
            all,
            ci,
            json,
            verbose,
            out,
        } => {
            if book.is_none() && !all {
                anyhow::bail!("pass --book <id> or --all");
            }
            let store = CorpusStore::open(&cli.root)?;
            if let Some(id) = &book {
                if !store.manifest.books.iter().any(|b| &b.book_id == id) {
                    anyhow::bail!("book '{id}' is not in the manifest");
                }
            }

            let report = content::scan_corpus(&store, book.as_deref(), !json);
            content::write_report(&report, &out)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if verbose {
                    for s in &report.sections {
                        println!(
                            "  {} {}/{}/{}: {}",
                            s.issue_type, s.book_id, s.page_id, s.block_id, s.text
                        );
                    }
                }
                println!(
                    "Scanned {} segments: {} flagged ({} critical, {} warnings). Report: {}",
                    report.summary.scanned,
                    report.summary.flagged,
                    report.summary.critical,
                    report.summary.warnings,
                    out.display()
                );
            }

            if ci && report.has_critical() {
                1
            } else {
                0
            }
        }
        Commands::ValidateSchema => {
            let store = CorpusStore::open(&cli.root)?;
            let report = schema::validate_corpus(&store);
            print_error_list(&report);
            println!(
                "Schema check: {} error(s) across {} book(s)",
                report.errors.len(),
                store.manifest.books.len()
            );
            if report.is_clean() {
                0
            } else {
                1
            }
        }
        Commands::Stats => {
            let store = CorpusStore::open(&cli.root)?;
            let mut pages = 0usize;
            let mut segments = 0usize;
            for entry in &store.manifest.books {
                let paths = store.page_paths(entry).unwrap_or_default();
                pages += paths.len();
                for path in &paths {
                    if let Ok(page) = store.load_page(path) {
                        segments += page.segments.len();
                    }
                }
            }
            println!("Corpus:   {}", store.manifest.corpus_id);
            println!("Schema:   v{}", store.manifest.schema_version);
            println!("Books:    {}", store.manifest.books.len());
            println!("Pages:    {pages}");
            println!("Segments: {segments}");
            0
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

/// Per-book check results, then the accumulated error list and summary.
fn run_integrity(store: &CorpusStore) -> i32 {
    let mut report = IntegrityReport::default();

    for entry in &store.manifest.books {
        let book_report = integrity::validate_book(store, entry);
        if book_report.is_clean() {
            println!("  ok   {}", entry.book_id);
        } else {
            println!(
                "  FAIL {} ({} error(s))",
                entry.book_id,
                book_report.errors.len()
            );
        }
        report.merge(book_report);
    }
    report.sort();

    print_error_list(&report);
    println!(
        "Integrity check: {} error(s), {} warning(s) across {} book(s)",
        report.errors.len(),
        report.warnings.len(),
        store.manifest.books.len()
    );

    if report.is_clean() {
        0
    } else {
        1
    }
}

fn print_error_list(report: &IntegrityReport) {
    for issue in &report.errors {
        let mut location = issue.book_id.clone();
        if let Some(page) = &issue.page_id {
            location.push('/');
            location.push_str(page);
        }
        println!("  [{}] {}: {}", issue.code, location, issue.detail);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
