// Command-line front-end
//
// Argument definitions and the command handlers. This is the presentation layer:
// it prints status lines as the job advances, shows transcripts and writes exports.
// Everything it shows comes from the session controller.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::{error, warn};

use crate::client::TranscriptionClient;
use crate::config::{ClientConfig, ENV_SERVER_URL};
use crate::config_validator::{validators, ConfigValidator};
use crate::error::ClientError;
use crate::export::ExportFormat;
use crate::file_utils::{export_path, read_text_file, save_export};
use crate::history::{summary_line, HistoryDisplay};
use crate::job_state::{progress_fraction, ClientJobState};
use crate::models::{Engine, JobRequest, ModelSize, ProgressEvent};
use crate::session::{SessionController, TranscriptView};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "video_transcriber",
    about = "Transcribe online videos through a transcription service",
    version
)]
pub struct CliArgs {
    /// Base URL of the transcription service (overrides TRANSCRIBER_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Enable debug mode with verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Transcribe a video URL and show the result
    Transcribe(TranscribeArgs),
    /// Browse past transcriptions
    #[command(subcommand)]
    History(HistoryCommand),
    /// Load a plain-text transcript exported earlier
    Import(ImportArgs),
    /// Print a sample configuration file
    SampleConfig,
}

#[derive(Args, Debug, Clone)]
pub struct TranscribeArgs {
    /// Video URL
    pub url: String,

    /// Transcription engine (whisper, faster-whisper)
    #[arg(long)]
    pub engine: Option<Engine>,

    /// Model size (tiny, base, small, medium)
    #[arg(long)]
    pub model_size: Option<ModelSize>,

    /// Language hint, e.g. "es" ("auto" to detect)
    #[arg(long)]
    pub language: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved transcriptions, most recent first
    List,
    /// Show one saved transcription
    Show {
        id: i64,
        /// Print the watch link for the segment at this index (0-based)
        #[arg(long)]
        cue: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a saved transcription
    Delete {
        id: i64,
        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Plain-text transcript file
    pub file: PathBuf,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Show per-segment timestamps when available
    #[arg(long)]
    pub timestamps: bool,

    /// Write the transcript in these formats (txt, srt)
    #[arg(long = "export", value_delimiter = ',')]
    pub export: Vec<ExportFormat>,

    /// Directory for exported files (overrides TRANSCRIBER_EXPORT_DIR)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

/// Builds the configuration from the environment, validating it first
pub fn build_config(args: &CliArgs) -> Result<ClientConfig, ClientError> {
    if let Err(results) = ConfigValidator::validate_all() {
        return Err(ClientError::Config(format!(
            "{} invalid configuration value(s): {}",
            results.errors.len(),
            results
                .errors
                .iter()
                .map(|e| e.field.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut config = ClientConfig::default();
    if let Some(server) = &args.server {
        validators::validate_http_url(ENV_SERVER_URL, server)
            .map_err(|e| ClientError::Config(e.to_string()))?;
        config.set_server_url(server);
    }
    Ok(config)
}

/// Runs the selected command
pub async fn run(args: CliArgs) -> Result<(), ClientError> {
    if let Command::SampleConfig = args.command {
        print!("{}", ConfigValidator::generate_sample_config());
        return Ok(());
    }

    let config = build_config(&args)?;
    let client = TranscriptionClient::new(config)?;
    let mut session = SessionController::new();

    match args.command {
        Command::Transcribe(transcribe) => run_transcribe(&client, &mut session, transcribe).await,
        Command::History(HistoryCommand::List) => run_history_list(&client).await,
        Command::History(HistoryCommand::Show { id, cue, output }) => {
            run_history_show(&client, &mut session, id, cue, output).await
        }
        Command::History(HistoryCommand::Delete { id, yes }) => {
            run_history_delete(&client, id, yes).await
        }
        Command::Import(import) => run_import(&client, &mut session, import),
        Command::SampleConfig => Ok(()),
    }
}

async fn run_transcribe(
    client: &TranscriptionClient,
    session: &mut SessionController,
    args: TranscribeArgs,
) -> Result<(), ClientError> {
    let config = client.config();
    let request = JobRequest::new(args.url)
        .with_engine(args.engine.unwrap_or(config.engine))
        .with_model_size(args.model_size.unwrap_or(config.model_size))
        .with_language(args.language.or_else(|| config.language.clone()));

    let result = client
        .run_job(session, &request, |event, state| print_progress(event, state))
        .await;

    if let Err(e) = result {
        if e.is_job_error() {
            eprintln!("Transcription failed: {}", e.user_message());
        } else {
            eprintln!("Error: {}", e.user_message());
        }
        return Err(e);
    }

    show_transcript(client, session, &args.output)
}

fn print_progress(event: &ProgressEvent, state: &ClientJobState) {
    let percent = (progress_fraction(event) * 100.0).round();
    match event {
        ProgressEvent::Transcribe {
            engine: Some(engine),
            model: Some(model),
        } => println!("[{:>3}%] {} ({} / {})", percent, state.status_text(), engine, model),
        ProgressEvent::Error { message } => println!("[fail] {}", message),
        _ => println!("[{:>3}%] {}", percent, state.status_text()),
    }
}

async fn run_history_list(client: &TranscriptionClient) -> Result<(), ClientError> {
    let browser = client.history_browser().await.map_err(|e| {
        error!("Error fetching history: {}", e);
        e
    })?;
    for line in browser.render_lines() {
        println!("{}", line);
    }
    Ok(())
}

async fn run_history_show(
    client: &TranscriptionClient,
    session: &mut SessionController,
    id: i64,
    cue: Option<usize>,
    output: OutputArgs,
) -> Result<(), ClientError> {
    let entry = client.get_history(id).await.map_err(|e| {
        error!("Error loading history item {}: {}", id, e);
        e
    })?;
    session.load_history(&entry);
    show_transcript(client, session, &output)?;

    if let Some(index) = cue {
        match session.cue(index) {
            Some(cue) => println!("Watch from {:.0}s: {}", cue.start, cue.watch_url),
            None => warn!("No playable segment at index {}", index),
        }
    }
    Ok(())
}

/// Asks on `output` whether to delete entry `id`; only "y" or "yes" confirms
pub fn confirm_delete<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    id: i64,
) -> io::Result<bool> {
    write!(output, "Delete transcription {}? This cannot be undone [y/N] ", id)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Deletes entry `id` once confirmed; returns whether the delete was sent
pub async fn delete_with_confirmation<R: BufRead, W: Write>(
    client: &TranscriptionClient,
    id: i64,
    skip_prompt: bool,
    input: R,
    output: W,
) -> Result<bool, ClientError> {
    if !skip_prompt && !confirm_delete(input, output, id)? {
        return Ok(false);
    }
    client.delete_history(id).await?;
    Ok(true)
}

async fn run_history_delete(
    client: &TranscriptionClient,
    id: i64,
    yes: bool,
) -> Result<(), ClientError> {
    let deleted = delete_with_confirmation(client, id, yes, io::stdin().lock(), io::stdout())
        .await
        .map_err(|e| {
            eprintln!("Error deleting transcription {}: {}", id, e.user_message());
            e
        })?;
    if !deleted {
        println!("Deletion cancelled");
        return Ok(());
    }
    println!("Deleted transcription {}", id);

    // The listing is only used to show what remains
    let browser = match client.history_browser().await {
        Ok(browser) => browser,
        Err(e) => {
            warn!("Could not refresh history after delete: {}", e);
            return Ok(());
        }
    };
    if browser.display() == HistoryDisplay::Empty {
        println!("{}", browser.render_lines().join("\n"));
    } else {
        for entry in browser.entries() {
            println!("{}", summary_line(entry));
        }
    }
    Ok(())
}

fn run_import(
    client: &TranscriptionClient,
    session: &mut SessionController,
    args: ImportArgs,
) -> Result<(), ClientError> {
    let text = read_text_file(&args.file)?;
    let title = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    session.load_view(TranscriptView::from_plain_text(title, text));
    show_transcript(client, session, &args.output)
}

fn show_transcript(
    client: &TranscriptionClient,
    session: &mut SessionController,
    output: &OutputArgs,
) -> Result<(), ClientError> {
    if output.timestamps && !session.set_timestamps(true) {
        warn!("No segments available, showing plain text");
    }

    let Some(view) = session.view() else {
        return Err(ClientError::protocol("no transcript to show"));
    };

    println!();
    println!("{}", view.title);
    let mut stats = Vec::new();
    if let Some(duration) = view.duration {
        stats.push(format!("{}s", duration));
    }
    if let Some(words) = view.word_count {
        stats.push(format!("{} words", words));
    }
    if !stats.is_empty() {
        println!("{}", stats.join(" | "));
    }
    println!();
    println!("{}", session.display_text());

    if output.export.is_empty() {
        return Ok(());
    }

    let mut target = client.config().clone();
    if let Some(dir) = &output.export_dir {
        target.export_dir = dir.clone();
    }
    target.ensure_export_dir()?;
    for format in &output.export {
        let path = export_path(&target.export_dir, &view.title, *format);
        save_export(&view.export(*format), &path)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcribe_args() {
        let args = CliArgs::try_parse_from([
            "video_transcriber",
            "--server",
            "http://10.0.0.5:8000",
            "transcribe",
            "https://youtu.be/dQw4w9WgXcQ",
            "--engine",
            "faster-whisper",
            "--model-size",
            "small",
            "--export",
            "txt,srt",
            "--timestamps",
        ])
        .unwrap();

        assert_eq!(args.server.as_deref(), Some("http://10.0.0.5:8000"));
        match args.command {
            Command::Transcribe(t) => {
                assert_eq!(t.engine, Some(Engine::FasterWhisper));
                assert_eq!(t.model_size, Some(ModelSize::Small));
                assert_eq!(t.output.export, vec![ExportFormat::Txt, ExportFormat::Srt]);
                assert!(t.output.timestamps);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_commands() {
        let args =
            CliArgs::try_parse_from(["video_transcriber", "history", "show", "4", "--cue", "2"])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::History(HistoryCommand::Show { id: 4, cue: Some(2), .. })
        ));

        let args = CliArgs::try_parse_from(["video_transcriber", "history", "delete", "4"]).unwrap();
        assert!(matches!(
            args.command,
            Command::History(HistoryCommand::Delete { id: 4, yes: false })
        ));

        for flag in ["--yes", "-y"] {
            let args =
                CliArgs::try_parse_from(["video_transcriber", "history", "delete", "4", flag])
                    .unwrap();
            assert!(matches!(
                args.command,
                Command::History(HistoryCommand::Delete { id: 4, yes: true })
            ));
        }
    }

    #[test]
    fn test_confirm_delete_answers() {
        let mut prompt = Vec::new();
        assert!(confirm_delete("y\n".as_bytes(), &mut prompt, 7).unwrap());
        assert!(String::from_utf8(prompt).unwrap().contains("Delete transcription 7?"));

        assert!(confirm_delete(" YES \n".as_bytes(), Vec::new(), 7).unwrap());
        assert!(!confirm_delete("n\n".as_bytes(), Vec::new(), 7).unwrap());
        assert!(!confirm_delete("\n".as_bytes(), Vec::new(), 7).unwrap());
        assert!(!confirm_delete("".as_bytes(), Vec::new(), 7).unwrap());
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        // Nothing listens on this port, so any request would fail
        let client =
            TranscriptionClient::new(ClientConfig::with_server_url("http://127.0.0.1:9")).unwrap();
        let deleted = delete_with_confirmation(&client, 3, false, "no\n".as_bytes(), Vec::new())
            .await
            .unwrap();
        assert!(!deleted);
    }

    #[test]
    fn test_server_override_is_validated() {
        let args = CliArgs::try_parse_from([
            "video_transcriber",
            "--server",
            "ftp://x",
            "history",
            "list",
        ])
        .unwrap();
        match build_config(&args) {
            Err(ClientError::Config(message)) => assert!(message.contains(ENV_SERVER_URL)),
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }

        let args = CliArgs::try_parse_from([
            "video_transcriber",
            "--server",
            "http://10.0.0.5:8000/",
            "history",
            "list",
        ])
        .unwrap();
        assert_eq!(build_config(&args).unwrap().server_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_rejects_unknown_engine() {
        assert!(CliArgs::try_parse_from([
            "video_transcriber",
            "transcribe",
            "https://youtu.be/dQw4w9WgXcQ",
            "--engine",
            "whisperx",
        ])
        .is_err());
    }
}
