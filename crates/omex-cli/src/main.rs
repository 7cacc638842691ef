//! Omex CLI - Command-line interface
//!
//! Usage:
//!   omex extract -i go.json -m star --term GO:0005634 -o module.json
//!   omex extract -i go.json -m mireot --lower-term GO:0005634 \
//!       --upper-term GO:0005575 --intermediates minimal -o go-slim.json
//!   omex import -c imports.cfg

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use omex_core::{
    GraphLoader, GraphWriter, ImportsPolicy, IndividualsPolicy, IntermediatesPolicy, Iri,
    ModuleStrategy, PrefixTable, unwrap_iri_token,
};
use omex_extract::{
    extract, parse_config, BatchDriver, ExtractOptions, Resolver, SeedTerms, SourceMap,
    SyntacticProvider, TermSpec,
};
use omex_io::{JsonLoader, JsonWriter};

#[derive(Parser)]
#[command(name = "omex")]
#[command(about = "Ontology module extraction toolkit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a module for a set of seed terms
    Extract {
        /// Input ontology document
        #[arg(short, long)]
        input: String,

        /// Extraction method: star, top, bot, or mireot
        #[arg(short, long, default_value = "star")]
        method: String,

        /// Seed term (repeatable)
        #[arg(long = "term")]
        terms: Vec<String>,

        /// File of seed terms (repeatable)
        #[arg(long = "term-file")]
        term_files: Vec<String>,

        /// MIREOT lower-bound term (repeatable)
        #[arg(long = "lower-term")]
        lower_terms: Vec<String>,

        /// File of MIREOT lower-bound terms
        #[arg(long = "lower-terms")]
        lower_term_files: Vec<String>,

        /// MIREOT upper-bound term (repeatable)
        #[arg(long = "upper-term")]
        upper_terms: Vec<String>,

        /// File of MIREOT upper-bound terms
        #[arg(long = "upper-terms")]
        upper_term_files: Vec<String>,

        /// MIREOT branch-from term (repeatable)
        #[arg(long = "branch-from-term")]
        branch_terms: Vec<String>,

        /// File of MIREOT branch-from terms
        #[arg(long = "branch-from-terms")]
        branch_term_files: Vec<String>,

        /// Intermediates policy: all, minimal, or none
        #[arg(long, default_value = "all")]
        intermediates: String,

        /// Individuals policy: include, minimal, definitions, or exclude
        #[arg(long, default_value = "include")]
        individuals: String,

        /// Imports policy: include or exclude
        #[arg(long, default_value = "include")]
        imports: String,

        /// Copy graph-level annotations to the output
        #[arg(long)]
        copy_ontology_annotations: bool,

        /// Stamp extracted terms with rdfs:isDefinedBy provenance
        #[arg(long)]
        annotate_with_source: bool,

        /// Term-to-source map file (tab-separated)
        #[arg(long)]
        sources: Option<String>,

        /// Proceed even when no seed term exists in the source
        #[arg(long)]
        force: bool,

        /// Output document
        #[arg(short, long)]
        output: String,

        /// IRI assigned to the output graph
        #[arg(long)]
        output_iri: Option<String>,
    },

    /// Create a set of imports from a batch config file
    Import {
        /// Batch configuration file
        #[arg(short, long)]
        config: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            input,
            method,
            terms,
            term_files,
            lower_terms,
            lower_term_files,
            upper_terms,
            upper_term_files,
            branch_terms,
            branch_term_files,
            intermediates,
            individuals,
            imports,
            copy_ontology_annotations,
            annotate_with_source,
            sources,
            force,
            output,
            output_iri,
        } => {
            let prefixes = PrefixTable::with_defaults();
            let loader = JsonLoader::new();
            let graph = loader.load(&input)?;

            let options = ExtractOptions {
                strategy: method.parse::<ModuleStrategy>()?,
                imports: imports.parse::<ImportsPolicy>()?,
                individuals: individuals.parse::<IndividualsPolicy>()?,
                intermediates: intermediates.parse::<IntermediatesPolicy>()?,
                annotate_with_source,
                copy_ontology_annotations,
                force,
                source_map: match &sources {
                    Some(path) => {
                        let text = std::fs::read_to_string(path)
                            .with_context(|| format!("reading source map {path}"))?;
                        SourceMap::parse(&text, &prefixes)?
                    }
                    None => SourceMap::new(),
                },
                annotations: Vec::new(),
            };

            let view = graph.view(options.imports);
            let resolver = Resolver::new(&prefixes, &view);

            let seeds = SeedTerms {
                terms: gather_terms(&resolver, &terms, &term_files)?,
                lower: gather_terms(&resolver, &lower_terms, &lower_term_files)?,
                upper: gather_terms(&resolver, &upper_terms, &upper_term_files)?,
                branch: gather_terms(&resolver, &branch_terms, &branch_term_files)?,
            };

            let mut module = extract(&graph, &seeds, &options, &SyntacticProvider::new())?;
            module.set_iri(output_iri.map(|iri| Iri::new(unwrap_iri_token(&iri))));

            JsonWriter::new().save(&module, &output)?;
            info!("extracted {} axioms into {}", module.axiom_count(), output);
        }

        Commands::Import { config } => {
            let text = std::fs::read_to_string(&config)
                .with_context(|| format!("reading config {config}"))?;
            let jobs = parse_config(&text)?;
            info!("running {} import jobs from {}", jobs.len(), config);

            let prefixes = PrefixTable::with_defaults();
            let loader = JsonLoader::new();
            let writer = JsonWriter::new();
            let provider = SyntacticProvider::new();
            BatchDriver::new(&loader, &writer, &provider, &prefixes).run(&jobs)?;
        }
    }

    Ok(())
}

/// Resolve inline term arguments and term-list files into specs
fn gather_terms(
    resolver: &Resolver<'_>,
    inline: &[String],
    files: &[String],
) -> anyhow::Result<Vec<TermSpec>> {
    let mut specs = Vec::new();
    for token in inline {
        specs.push(resolver.parse_term_line(token)?);
    }
    for path in files {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading term file {path}"))?;
        let parsed = resolver
            .parse_term_list(&text)
            .with_context(|| format!("resolving terms from {path}"))?;
        specs.extend(parsed);
    }
    Ok(specs)
}
