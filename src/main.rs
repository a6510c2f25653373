//! Storefront Templates CLI
//!
//! Usage:
//!   storefront-templates [OPTIONS] <COMMAND>
//!
//! Commands:
//!   sections      List registered section types
//!   pages         List page templates
//!   new           Create a document from a page template
//!   instantiate   Print a fresh section fragment
//!   validate      Validate a document
//!   resolve       Resolve placeholders and style variables
//!   merge         Validate a modification against a document

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;

use storefront_templates::validator::parse_document;
use storefront_templates::{
    ContentContext, Document, Engine, EngineConfig, ValidationError, ValidationReport,
};

#[derive(Parser)]
#[command(name = "storefront-templates")]
#[command(about = "Section-based storefront page documents")]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Section catalog (JSON) to use instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered section types
    Sections {
        #[arg(long)]
        category: Option<String>,
    },
    /// List page templates
    Pages,
    /// Create a document from a page template
    New {
        page: String,
        /// Output file (stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a fresh fragment for a section type
    Instantiate { section_type: String },
    /// Validate a document, optionally against the version it replaces
    Validate {
        document: PathBuf,
        #[arg(long)]
        prior: Option<PathBuf>,
    },
    /// Resolve placeholders and style variables into a render tree
    Resolve {
        document: PathBuf,
        /// Content JSON
        #[arg(long)]
        content: Option<PathBuf>,
        /// Image URL, repeatable
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Validate a modification and print the previewed render tree
    Merge {
        document: PathBuf,
        modification: PathBuf,
        #[arg(long)]
        content: Option<PathBuf>,
        /// Print the committed document instead of the preview
        #[arg(long)]
        apply: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let engine = load_engine(&cli);
    if !run(&engine, cli.command) {
        process::exit(1);
    }
}

fn load_engine(cli: &Cli) -> Engine {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| {
            fail(&format!("Error loading config '{}': {}", path.display(), e))
        }),
        None => EngineConfig::default(),
    };
    if let Some(catalog) = &cli.catalog {
        config = config.with_catalog(catalog);
    }
    Engine::new(config).unwrap_or_else(|e| fail(&format!("Error: {}", e)))
}

/// Returns false when the command should exit non-zero
fn run(engine: &Engine, command: Command) -> bool {
    let registry = engine.registry();
    match command {
        Command::Sections { category } => {
            for def in registry.list(category.as_deref()) {
                let max = def
                    .max_count
                    .map_or_else(|| "-".to_string(), |m| m.to_string());
                let required = if def.required { "required" } else { "" };
                println!(
                    "{:<14} {:<22} {:<14} max {:<3} {}",
                    def.id, def.name, def.category, max, required
                );
            }
            true
        }
        Command::Pages => {
            for page in registry.pages() {
                println!("{:<18} {:<24} {}", page.id, page.name, page.sections.join(", "));
            }
            true
        }
        Command::New { page, output } => match engine.new_document(&page) {
            Ok(doc) => write_output(output.as_deref(), &doc.to_json_pretty()),
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        },
        Command::Instantiate { section_type } => match registry.instantiate(&section_type) {
            Ok(node) => write_output(None, &serde_json::to_string_pretty(&node).unwrap_or_default()),
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        },
        Command::Validate { document, prior } => {
            let json = read_file(&document);
            let prior = prior.map(|p| load_document(&p));
            let (_, report) = engine.validator().validate_json(&json, prior.as_ref());
            print_report(&report);
            if report.valid {
                println!("valid");
            }
            report.valid
        }
        Command::Resolve {
            document,
            content,
            images,
        } => {
            let doc = load_document(&document);
            let ctx = load_content(content.as_deref()).with_images(images);
            let tree = engine.resolver().resolve(&doc, &ctx);
            println!("{}", tree.to_json_pretty());
            true
        }
        Command::Merge {
            document,
            modification,
            content,
            apply,
        } => {
            let doc = load_document(&document);
            let json = read_file(&modification);
            let mut session = engine.session(doc, load_content(content.as_deref()));
            let resolved = match session.propose_json(&json) {
                Ok(preview) => {
                    for warning in &preview.warnings {
                        eprintln!("warning{}", warning);
                    }
                    preview.resolved.to_json_pretty()
                }
                Err(rejection) => {
                    print_report(&ValidationReport::new(rejection.errors, rejection.warnings));
                    eprintln!("modification rejected, document unchanged");
                    return false;
                }
            };
            if apply {
                match session.apply() {
                    Some(committed) => println!("{}", committed.to_json_pretty()),
                    None => return false,
                }
            } else {
                println!("{}", resolved);
            }
            true
        }
    }
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        print_error(error);
    }
    for warning in &report.warnings {
        eprintln!("warning{}", warning);
    }
}

fn print_error(error: &ValidationError) {
    match error.report() {
        Some(report) => eprint!("{}", report),
        None => eprintln!("error[{}]: {}", error.kind(), error),
    }
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Error reading file '{}': {}", path.display(), e)))
}

fn load_document(path: &Path) -> Document {
    match parse_document(&read_file(path)) {
        Ok(doc) => doc,
        Err(errors) => {
            for error in &errors {
                print_error(error);
            }
            fail(&format!("'{}' is not a valid document", path.display()))
        }
    }
}

fn load_content(path: Option<&Path>) -> ContentContext {
    let Some(path) = path else {
        return ContentContext::default();
    };
    ContentContext::from_json(&read_file(path))
        .unwrap_or_else(|e| fail(&format!("Error parsing content '{}': {}", path.display(), e)))
}

fn write_output(path: Option<&Path>, text: &str) -> bool {
    match path {
        Some(path) => match fs::write(path, text) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("Error writing file '{}': {}", path.display(), e);
                false
            }
        },
        None => {
            println!("{}", text);
            true
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
