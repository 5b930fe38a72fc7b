//! `logship project` command handler
//!
//! Replays the records of Avro object container files as hash-referenced
//! events, exactly as the streaming source would deliver them, and prints
//! the resulting documents.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apache_avro::rabin::Rabin;
use apache_avro::{Reader, to_avro_datum};
use serde::Serialize;
use tracing::{debug, info};

use logship_core::event::Event;
use logship_serializer::{ConfigStore, EventPipelineBuilder, PipelineStats};

use crate::cli::ProjectArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `project` command.
pub async fn execute(
    args: ProjectArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = project_files(&args, config_path).await?;

    info!(
        received = report.stats.received,
        filtered = report.stats.filtered,
        projected = report.stats.projected,
        failed = report.stats.failed,
        "projection finished"
    );

    writer.render(&report)
}

/// Run every container through a single pipeline so the schema cache is
/// shared across files.
async fn project_files(args: &ProjectArgs, config_path: &Path) -> Result<ProjectReport, CliError> {
    let config = Arc::new(ConfigStore::load_or_default(config_path).await);
    let pipeline = EventPipelineBuilder::new().config(config).build();
    let batch_size = args.batch_size.max(1) as usize;

    let mut documents = Vec::new();
    for path in &args.files {
        let events = read_container_events(path.clone()).await?;
        info!(path = %path.display(), events = events.len(), "container loaded");

        let mut events = events.into_iter().peekable();
        while events.peek().is_some() {
            let batch: Vec<Event> = events.by_ref().take(batch_size).collect();
            documents.extend(pipeline.process_batch(batch).await);
        }
    }

    Ok(ProjectReport {
        documents,
        stats: pipeline.stats(),
    })
}

/// Read a container file into hash-referenced events.
///
/// Each record is re-encoded as a bare datum. The `file` header carries the
/// container path and the hash header its writer schema fingerprint.
///
/// # Errors
///
/// Returns `CliError::Input` if the file cannot be opened or is not a valid
/// container.
pub async fn read_container_events(path: PathBuf) -> Result<Vec<Event>, CliError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || read_container_blocking(&path))
        .await
        .map_err(|e| CliError::Command(format!("container reader task failed: {}", e)))?
        .map_err(|reason| CliError::Input {
            path: display,
            reason,
        })
}

fn read_container_blocking(path: &Path) -> Result<Vec<Event>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = Reader::new(BufReader::new(file)).map_err(|e| e.to_string())?;
    let schema = reader.writer_schema().clone();
    let fingerprint = schema.fingerprint::<Rabin>().to_string();
    let file_header = path.display().to_string();
    debug!(path = %file_header, fingerprint = %fingerprint, "container schema read");

    let mut events = Vec::new();
    for value in reader {
        let value = value.map_err(|e| e.to_string())?;
        let datum = to_avro_datum(&schema, value).map_err(|e| e.to_string())?;
        events.push(Event::with_schema_hash(
            fingerprint.clone(),
            file_header.clone(),
            datum,
        ));
    }
    Ok(events)
}

/// Projected documents plus pipeline counters.
#[derive(Serialize)]
pub struct ProjectReport {
    pub documents: Vec<serde_json::Value>,
    pub stats: PipelineStats,
}

impl Render for ProjectReport {
    /// One compact document per line, ready for a bulk loader.
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for document in &self.documents {
            serde_json::to_writer(&mut *w, document)?;
            writeln!(w)?;
        }
        Ok(())
    }
}
