use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;

use surgview_core::{
    ActiveCommentMonitor, ActiveCommentSlot, ApiContext, CommentController, Evaluation,
    FinishedLabel, LabelTracker, Layout, PlatformClient, ReviewConfig, SessionApi, SessionData,
    cache, classify_comment, display_text, format_session_readable, format_timestamp,
    sync_to_reference,
};

#[cfg(feature = "dictation")]
use surgview_core::{TranscriptAppender, TranscriptQueue, dictation};

/// CLI wrapper for Layout (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliLayout {
    #[default]
    Single,
    SideBySide,
    Grid,
}

impl From<CliLayout> for Layout {
    fn from(cli: CliLayout) -> Self {
        match cli {
            CliLayout::Single => Layout::Single,
            CliLayout::SideBySide => Layout::SideBySide,
            CliLayout::Grid => Layout::Grid,
        }
    }
}

#[derive(Parser)]
#[command(name = "surgview")]
#[command(
    about = "Review surgical training sessions: annotated timelines, timestamped comments, and ISBAR evaluations"
)]
struct Cli {
    /// Base URL of the training platform
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// API credentials as `key:secret`. Defaults to $SURGVIEW_API_TOKEN.
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a session and print its annotated timelines
    Show {
        session: String,

        /// Re-fetch even if a cached copy exists
        #[arg(short, long)]
        force: bool,

        /// Print the raw session aggregate as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Replay a video's timeline, surfacing comments as they become active
    Watch {
        session: String,

        /// Video title; defaults to the session's first video
        video: Option<String>,

        /// Layout deciding which videos take part in the initial sync
        #[arg(long, default_value = "single")]
        layout: CliLayout,

        /// Replay speed multiplier
        #[arg(long, default_value_t = 10.0)]
        rate: f64,
    },

    /// Add a timestamped comment to a video
    Comment {
        session: String,
        video: String,

        /// Timestamp in seconds
        #[arg(long)]
        at: f64,

        /// Comment text
        #[arg(long)]
        text: Option<String>,

        /// Close the annotation at this timestamp (start/end labeling)
        #[arg(long, conflicts_with = "duration")]
        end_at: Option<f64>,

        /// Annotation span in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Annotation category (e.g. situation, assessment)
        #[arg(long = "type")]
        comment_type: Option<String>,

        /// Append a dictated WAV recording (16 kHz mono) to the comment text
        #[arg(long)]
        dictate: Option<PathBuf>,

        /// Whisper model file used for dictation
        #[arg(long, requires = "dictate")]
        model: Option<PathBuf>,
    },

    /// Edit a comment's text or its annotation span
    Edit {
        session: String,
        comment: String,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        duration: Option<f64>,
    },

    /// Delete a comment
    Delete {
        session: String,
        comment: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Submit an ISBAR evaluation as a marked comment
    Evaluate {
        session: String,
        video: String,

        #[arg(long, default_value_t = 0.0)]
        at: f64,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        identification: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        situation: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        history: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        examination: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        assessment: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        recommendation: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        global_rating: Option<u8>,

        #[arg(long)]
        notes: Option<String>,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let context = match cli.token {
        Some(token) => ApiContext::new(&cli.base_url, Some(token)),
        None => ApiContext::from_env(&cli.base_url),
    };
    let client = Arc::new(PlatformClient::new(context));

    match cli.command {
        Command::Show { session, force, json } => run_show(client, &session, force, json).await,
        Command::Watch {
            session,
            video,
            layout,
            rate,
        } => run_watch(client, &session, video, layout.into(), rate).await,
        Command::Comment {
            session,
            video,
            at,
            text,
            end_at,
            duration,
            comment_type,
            dictate,
            model,
        } => {
            let controller = connect(&client, &session).await?.1;
            let store = controller.store().clone();
            store.set_time(&video, at);
            if let Some(text) = &text {
                store.set_draft(&video, text);
            }

            if let Some(wav) = &dictate {
                #[cfg(feature = "dictation")]
                {
                    let model = model.as_ref().context("--model is required with --dictate")?;
                    append_dictation(&store, &video, wav, model).await?;
                }
                #[cfg(not(feature = "dictation"))]
                {
                    let _ = (wav, &model);
                    anyhow::bail!(
                        "this build has no dictation support; rebuild with --features dictation"
                    );
                }
            }

            let label = if let Some(end) = end_at {
                let mut tracker = LabelTracker::new();
                let id = tracker.start(&video, at, comment_type.as_deref().unwrap_or("general"))?;
                Some(tracker.finish(id, end)?)
            } else {
                duration.map(|d| FinishedLabel {
                    video_title: video.clone(),
                    timestamp: at,
                    duration: d,
                    comment_type: comment_type.clone().unwrap_or_else(|| "general".to_string()),
                })
            };

            match label {
                Some(label) => {
                    let text_now = store.draft(&video);
                    controller.add_labelled_comment(&label, &text_now).await?;
                    println!(
                        "{} Comment added: {}\u{2013}{}",
                        style("✓").green().bold(),
                        format_timestamp(label.timestamp),
                        format_timestamp(label.timestamp + label.duration)
                    );
                }
                None => match controller.add_comment(&video).await? {
                    Some(t) => println!(
                        "{} Comment added at {}",
                        style("✓").green().bold(),
                        format_timestamp(t)
                    ),
                    None => println!("Nothing to submit: comment text is empty"),
                },
            }
            Ok(())
        }
        Command::Edit {
            session,
            comment,
            text,
            duration,
        } => {
            let controller = connect(&client, &session).await?.1;
            match (text, duration) {
                (Some(text), None) => controller.update_comment_text(&comment, &text).await?,
                (None, Some(duration)) => {
                    controller.update_comment_duration(&comment, duration).await?
                }
                _ => anyhow::bail!("pass exactly one of --text or --duration"),
            }
            println!("{} Comment updated", style("✓").green().bold());
            Ok(())
        }
        Command::Delete {
            session,
            comment,
            yes,
        } => {
            if !yes && !confirm_delete(&comment)? {
                println!("Aborted.");
                return Ok(());
            }
            let controller = connect(&client, &session).await?.1;
            controller.delete_comment(&comment).await?;
            println!("{} Comment deleted", style("✓").green().bold());
            Ok(())
        }
        Command::Evaluate {
            session,
            video,
            at,
            identification,
            situation,
            history,
            examination,
            assessment,
            recommendation,
            global_rating,
            notes,
        } => {
            let evaluation = Evaluation {
                identification,
                situation,
                history,
                examination,
                assessment,
                recommendation,
                global_rating,
                notes: notes.unwrap_or_default(),
            };
            let (total, max) = evaluation.partial_score();
            let rated = evaluation.rated_count();

            let controller = connect(&client, &session).await?.1;
            controller.add_evaluation(&video, at, &evaluation).await?;
            println!(
                "{} Evaluation submitted: {total}/{max} ({rated} of 7 rated)",
                style("✓").green().bold()
            );
            Ok(())
        }
    }
}

async fn connect(
    client: &Arc<PlatformClient>,
    session: &str,
) -> Result<(SessionData, CommentController)> {
    let spinner = create_spinner("Loading session...");
    let result = CommentController::connect(client.clone(), session).await;
    match result {
        Ok(loaded) => {
            spinner.finish_with_message(format!(
                "{} Session loaded: {}",
                style("✓").green().bold(),
                style(&loaded.0.session.title).cyan()
            ));
            Ok(loaded)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.into())
        }
    }
}

async fn run_show(
    client: Arc<PlatformClient>,
    session: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let cache_dir = cache::session_cache_dir(client.context().base_url(), session);
    let cache_path = cache::session_data_path(&cache_dir);

    let data = if !force && cache_path.exists() {
        let data = cache::load_cached_session(&cache_path).await?;
        eprintln!(
            "{} Session loaded {}",
            style("✓").green().bold(),
            style("(cached)").dim()
        );
        data
    } else {
        let spinner = create_spinner("Fetching session...");
        let data = client.get_session_details(session).await?;
        cache::save_cached_session(&data, &cache_path).await?;
        spinner.finish_with_message(format!("{} Session fetched", style("✓").green().bold()));
        data
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", format_session_readable(&data));
    }
    Ok(())
}

async fn run_watch(
    client: Arc<PlatformClient>,
    session: &str,
    video: Option<String>,
    layout: Layout,
    rate: f64,
) -> Result<()> {
    anyhow::ensure!(rate > 0.0, "replay rate must be positive");

    let (data, controller) = connect(&client, session).await?;
    let store = controller.store().clone();
    let title = match video {
        Some(title) => title,
        None => data
            .videos
            .first()
            .map(|v| v.title.clone())
            .context("session has no videos")?,
    };
    let duration = data
        .video(&title)
        .with_context(|| format!("no video titled {title:?} in this session"))?
        .duration;
    anyhow::ensure!(duration > 0.0, "video {title:?} has no known duration to replay");

    let active = layout.active_titles(&data.videos);
    if !active.is_empty() {
        match sync_to_reference(&store, &title, &active) {
            Ok(synced) => println!(
                "{} Synced {synced} videos to {}",
                style("✓").green().bold(),
                style(&title).cyan()
            ),
            Err(e) => eprintln!("{} {e}", style("Sync unavailable:").yellow().bold()),
        }
    }

    store.set_playing(&title, true);

    let config = ReviewConfig::default();
    let slot = ActiveCommentSlot::new();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let monitor = ActiveCommentMonitor::new(
        store.clone(),
        controller.comments(),
        title.clone(),
        config.clone(),
        Arc::clone(&slot),
    );
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    println!(
        "\nReplaying {} ({}) at {rate:.0}x\n",
        style(&title).cyan().bold(),
        format_timestamp(duration)
    );

    let step = config.tick_interval.as_secs_f64() * rate;
    let mut last_active: Option<String> = None;
    loop {
        tokio::time::sleep(config.tick_interval).await;
        let next = (store.current_time(&title) + step).min(duration);
        store.set_time(&title, next);

        while let Some(sample) = slot.take() {
            match sample.comment {
                Some(comment) if last_active.as_deref() != Some(comment.name.as_str()) => {
                    last_active = Some(comment.name.clone());
                    println!(
                        "[{}] {} {} \u{2014} {}",
                        style(format_timestamp(sample.position)).cyan(),
                        style(classify_comment(&comment.comment_text).label()).yellow(),
                        comment.doctor_name.as_deref().unwrap_or(&comment.doctor),
                        display_text(&comment.comment_text).trim()
                    );
                }
                Some(_) => {}
                None => last_active = None,
            }
        }

        if next >= duration {
            break;
        }
    }

    store.set_playing(&title, false);
    let _ = shutdown_tx.send(());
    let _ = monitor_handle.await;
    println!("\n{} Replay finished", style("✓").green().bold());
    Ok(())
}

fn confirm_delete(comment: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!("Delete comment {comment}? [y/N] "))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(feature = "dictation")]
async fn append_dictation(
    store: &surgview_core::PlaybackStateStore,
    video: &str,
    wav: &PathBuf,
    model: &PathBuf,
) -> Result<()> {
    let queue = TranscriptQueue::new(64);
    let spinner = create_spinner("Transcribing dictation...");
    let queued = {
        let queue = Arc::clone(&queue);
        let wav = wav.clone();
        let model = model.clone();
        tokio::task::spawn_blocking(move || dictation::transcribe_wav_into(&queue, &wav, &model))
            .await??
    };
    spinner.finish_with_message(format!(
        "{} Transcribed {queued} segments",
        style("✓").green().bold()
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let appender = TranscriptAppender::new(Arc::clone(&queue), store.clone(), video);
    let handle = tokio::spawn(appender.run(shutdown_rx));
    while !queue.is_empty() {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    let _ = shutdown_tx.send(());
    let _ = handle.await;
    Ok(())
}
