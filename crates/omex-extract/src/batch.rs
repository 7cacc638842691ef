//! Batch Config Driver
//!
//! Parses a declarative job-list document and drives one extraction
//! per job, producing a generated import for each. The format is a
//! sequence of directive blocks: a `! <directive>` line introduces a
//! block, argument lines follow until the next `!` line or end of
//! file, and columns within an argument line are tab-separated. A
//! `! source` directive begins a new job.
//!
//! The driver fails fast: the first error from any sub-component
//! aborts the batch, wrapped with the failing job's identifier.

use tracing::info;

use omex_core::{
    GraphLoader, GraphWriter, ImportsPolicy, IndividualsPolicy, IntermediatesPolicy, Iri,
    ModuleProvider, ModuleStrategy, OmexError, PrefixTable, Result, is_absolute_iri,
    unwrap_iri_token,
};

use crate::annotate::{AnnotationDirective, SourceMap};
use crate::resolve::{split_columns, Resolver};
use crate::{extract, ExtractOptions, SeedTerms};

// ============================================================================
// Job Description
// ============================================================================

/// One raw argument line, with its 1-based line number for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line: usize,
    pub text: String,
}

/// A parsed extraction job. Term and directive lines stay raw until
/// the job's graphs are loaded, since resolution needs their label
/// indexes.
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// Job identifier used in diagnostics (the output path)
    pub id: String,
    /// Input ontology specification
    pub source: String,
    /// Optional secondary graph, used only for label resolution
    pub target: Option<String>,
    /// Output destination
    pub output: String,
    /// IRI assigned to the generated import
    pub output_iri: Option<Iri>,
    pub strategy: ModuleStrategy,
    pub imports: ImportsPolicy,
    pub individuals: IndividualsPolicy,
    pub intermediates: IntermediatesPolicy,
    pub annotate_source: bool,
    pub copy_ontology_annotations: bool,
    pub force: bool,
    pub terms: Vec<RawLine>,
    pub lower: Vec<RawLine>,
    pub upper: Vec<RawLine>,
    pub branch: Vec<RawLine>,
    pub annotations: Vec<RawLine>,
    pub source_map: Vec<RawLine>,
}

// ============================================================================
// Config Parsing
// ============================================================================

const DIRECTIVES: &[&str] = &[
    "source",
    "target",
    "output",
    "method",
    "intermediates",
    "imports",
    "individuals",
    "annotate-source",
    "copy-ontology-annotations",
    "force",
    "terms",
    "lower-terms",
    "upper-terms",
    "branch-terms",
    "annotations",
    "source-map",
];

#[derive(Debug, Default)]
struct JobDraft {
    start_line: usize,
    source: Vec<RawLine>,
    target: Vec<RawLine>,
    output: Vec<RawLine>,
    method: Vec<RawLine>,
    intermediates: Vec<RawLine>,
    imports: Vec<RawLine>,
    individuals: Vec<RawLine>,
    annotate_source: Vec<RawLine>,
    copy_ontology_annotations: Vec<RawLine>,
    force: Vec<RawLine>,
    terms: Vec<RawLine>,
    lower: Vec<RawLine>,
    upper: Vec<RawLine>,
    branch: Vec<RawLine>,
    annotations: Vec<RawLine>,
    source_map: Vec<RawLine>,
}

impl JobDraft {
    fn push(&mut self, directive: &str, raw: RawLine) {
        match directive {
            "source" => self.source.push(raw),
            "target" => self.target.push(raw),
            "output" => self.output.push(raw),
            "method" => self.method.push(raw),
            "intermediates" => self.intermediates.push(raw),
            "imports" => self.imports.push(raw),
            "individuals" => self.individuals.push(raw),
            "annotate-source" => self.annotate_source.push(raw),
            "copy-ontology-annotations" => self.copy_ontology_annotations.push(raw),
            "force" => self.force.push(raw),
            "terms" => self.terms.push(raw),
            "lower-terms" => self.lower.push(raw),
            "upper-terms" => self.upper.push(raw),
            "branch-terms" => self.branch.push(raw),
            "annotations" => self.annotations.push(raw),
            "source-map" => self.source_map.push(raw),
            _ => unreachable!("directive names are validated before dispatch"),
        }
    }

    fn build(self) -> Result<ImportJob> {
        let source = required_single(&self.source, "source", self.start_line)?;
        let output_line = required_single_line(&self.output, "output", self.start_line)?;
        let output_columns = split_columns(&output_line.text);
        let output = output_columns
            .first()
            .cloned()
            .ok_or_else(|| missing(self.start_line, "output"))?;
        let output_iri = match output_columns.get(1) {
            Some(token) if is_absolute_iri(token) => Some(Iri::new(unwrap_iri_token(token))),
            Some(token) => {
                return Err(OmexError::InvalidOption(format!(
                    "output IRI '{token}' must be an absolute IRI"
                ))
                .at_line(output_line.line))
            }
            None => None,
        };

        let method_line = required_single_line(&self.method, "method", self.start_line)?;
        let strategy: ModuleStrategy = method_line
            .text
            .trim()
            .parse()
            .map_err(|e: OmexError| e.at_line(method_line.line))?;

        Ok(ImportJob {
            id: output.clone(),
            source,
            target: optional_single(&self.target, "target")?,
            output,
            output_iri,
            strategy,
            imports: parse_policy(&self.imports, ImportsPolicy::default())?,
            individuals: parse_policy(&self.individuals, IndividualsPolicy::default())?,
            intermediates: parse_policy(&self.intermediates, IntermediatesPolicy::default())?,
            annotate_source: parse_flag(&self.annotate_source)?,
            copy_ontology_annotations: parse_flag(&self.copy_ontology_annotations)?,
            force: parse_flag(&self.force)?,
            terms: self.terms,
            lower: self.lower,
            upper: self.upper,
            branch: self.branch,
            annotations: self.annotations,
            source_map: self.source_map,
        })
    }
}

fn missing(start_line: usize, directive: &str) -> OmexError {
    OmexError::InvalidOption(format!(
        "job starting at line {start_line} requires a '{directive}' directive"
    ))
}

fn required_single_line<'a>(
    lines: &'a [RawLine],
    directive: &str,
    start_line: usize,
) -> Result<&'a RawLine> {
    match lines {
        [] => Err(missing(start_line, directive)),
        [single] => Ok(single),
        [_, extra, ..] => Err(OmexError::InvalidOption(format!(
            "directive '{directive}' expects a single argument line"
        ))
        .at_line(extra.line)),
    }
}

fn required_single(lines: &[RawLine], directive: &str, start_line: usize) -> Result<String> {
    required_single_line(lines, directive, start_line).map(|raw| raw.text.trim().to_string())
}

fn optional_single(lines: &[RawLine], directive: &str) -> Result<Option<String>> {
    match lines {
        [] => Ok(None),
        [single] => Ok(Some(single.text.trim().to_string())),
        [_, extra, ..] => Err(OmexError::InvalidOption(format!(
            "directive '{directive}' expects a single argument line"
        ))
        .at_line(extra.line)),
    }
}

fn parse_policy<P>(lines: &[RawLine], default: P) -> Result<P>
where
    P: std::str::FromStr<Err = OmexError>,
{
    match lines {
        [] => Ok(default),
        [single] => single
            .text
            .trim()
            .parse()
            .map_err(|e: OmexError| e.at_line(single.line)),
        [_, extra, ..] => Err(OmexError::InvalidOption(
            "policy directives expect a single argument line".to_string(),
        )
        .at_line(extra.line)),
    }
}

fn parse_flag(lines: &[RawLine]) -> Result<bool> {
    match lines {
        [] => Ok(false),
        [single] => match single.text.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(OmexError::InvalidOption(format!(
                "expected 'true' or 'false', got '{other}'"
            ))
            .at_line(single.line)),
        },
        [_, extra, ..] => Err(OmexError::InvalidOption(
            "flag directives expect a single argument line".to_string(),
        )
        .at_line(extra.line)),
    }
}

/// Parse a job-list document into its jobs
pub fn parse_config(text: &str) -> Result<Vec<ImportJob>> {
    let mut jobs = Vec::new();
    let mut draft: Option<JobDraft> = None;
    let mut current: Option<String> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(name) = trimmed.strip_prefix('!') {
            let name = name.trim().to_lowercase();
            if !DIRECTIVES.contains(&name.as_str()) {
                return Err(
                    OmexError::InvalidOption(format!("unknown directive '{name}'")).at_line(line_no)
                );
            }
            if name == "source" {
                if let Some(done) = draft.take() {
                    jobs.push(done.build()?);
                }
                draft = Some(JobDraft {
                    start_line: line_no,
                    ..JobDraft::default()
                });
            } else if draft.is_none() {
                return Err(OmexError::InvalidOption(format!(
                    "directive '{name}' before the first '! source'"
                ))
                .at_line(line_no));
            }
            current = Some(name);
            continue;
        }

        let Some(directive) = &current else {
            return Err(OmexError::InvalidOption(format!(
                "argument line '{trimmed}' outside any directive block"
            ))
            .at_line(line_no));
        };
        let job = draft.as_mut().expect("a directive implies an open job");
        job.push(
            directive,
            RawLine {
                line: line_no,
                text: line.to_string(),
            },
        );
    }

    if let Some(done) = draft.take() {
        jobs.push(done.build()?);
    }
    Ok(jobs)
}

// ============================================================================
// Driver
// ============================================================================

/// Runs parsed jobs against injected collaborators
pub struct BatchDriver<'a> {
    loader: &'a dyn GraphLoader,
    writer: &'a dyn GraphWriter,
    provider: &'a dyn ModuleProvider,
    prefixes: &'a PrefixTable,
}

impl<'a> BatchDriver<'a> {
    /// Create a driver
    pub fn new(
        loader: &'a dyn GraphLoader,
        writer: &'a dyn GraphWriter,
        provider: &'a dyn ModuleProvider,
        prefixes: &'a PrefixTable,
    ) -> Self {
        Self {
            loader,
            writer,
            provider,
            prefixes,
        }
    }

    /// Run every job in order, aborting on the first failure
    pub fn run(&self, jobs: &[ImportJob]) -> Result<()> {
        for job in jobs {
            self.run_job(job).map_err(|e| e.in_job(&job.id))?;
        }
        Ok(())
    }

    fn run_job(&self, job: &ImportJob) -> Result<()> {
        info!("importing terms from {} into {}", job.source, job.output);
        let source = self.loader.load(&job.source)?;
        let target = match &job.target {
            Some(spec) => Some(self.loader.load(spec)?),
            None => None,
        };

        let view = source.view(job.imports);
        let target_view = target.as_ref().map(|t| t.view(ImportsPolicy::Include));
        let mut resolver = Resolver::new(self.prefixes, &view);
        if let Some(tv) = &target_view {
            resolver = resolver.with_target(tv);
        }

        let seeds = SeedTerms {
            terms: resolve_lines(&resolver, &job.terms)?,
            lower: resolve_lines(&resolver, &job.lower)?,
            upper: resolve_lines(&resolver, &job.upper)?,
            branch: resolve_lines(&resolver, &job.branch)?,
        };

        let annotations = parse_directives(&resolver, &job.annotations)?;
        let mut source_map = SourceMap::new();
        for raw in &job.source_map {
            source_map
                .parse_line(&raw.text, self.prefixes)
                .map_err(|e| e.at_line(raw.line))?;
        }

        let options = ExtractOptions {
            strategy: job.strategy,
            imports: job.imports,
            individuals: job.individuals,
            intermediates: job.intermediates,
            annotate_with_source: job.annotate_source,
            copy_ontology_annotations: job.copy_ontology_annotations,
            force: job.force,
            source_map,
            annotations,
        };

        let mut output = extract(&source, &seeds, &options, self.provider)?;
        output.set_iri(job.output_iri.clone());
        self.writer.save(&output, &job.output)?;
        info!("extracted {} axioms into {}", output.axiom_count(), job.output);
        Ok(())
    }
}

fn resolve_lines(resolver: &Resolver<'_>, lines: &[RawLine]) -> Result<Vec<crate::TermSpec>> {
    lines
        .iter()
        .map(|raw| resolver.parse_term_line(&raw.text).map_err(|e| e.at_line(raw.line)))
        .collect()
}

/// Parse annotation directive lines: a property token, optionally
/// followed by a `copyTo`/`mapTo` keyword and a target property token.
fn parse_directives(
    resolver: &Resolver<'_>,
    lines: &[RawLine],
) -> Result<Vec<AnnotationDirective>> {
    let mut directives = Vec::new();
    for raw in lines {
        let directive = parse_directive_line(resolver, &raw.text).map_err(|e| e.at_line(raw.line))?;
        directives.push(directive);
    }
    Ok(directives)
}

fn parse_directive_line(resolver: &Resolver<'_>, line: &str) -> Result<AnnotationDirective> {
    let columns = split_columns(line);
    match columns.as_slice() {
        [property] => Ok(AnnotationDirective::copy(resolver.resolve(property)?)),
        [property, keyword, target] => {
            let property = resolver.resolve(property)?;
            let target = resolver.resolve(target)?;
            if keyword.eq_ignore_ascii_case("copyto") {
                Ok(AnnotationDirective::copy_to(property, target))
            } else if keyword.eq_ignore_ascii_case("mapto") {
                Ok(AnnotationDirective::map_to(property, target))
            } else {
                Err(OmexError::InvalidOption(format!(
                    "unknown annotation keyword '{keyword}' (expected copyTo or mapTo)"
                )))
            }
        }
        _ => Err(OmexError::InvalidOption(format!(
            "annotation directive '{}' must have one or three columns",
            line.trim()
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
