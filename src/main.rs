//! EPUB Translator - 命令行入口
//!
//! 子命令：
//! - translate: 逐章翻译并渲染输出，可随时中断后恢复
//! - show-chapters: 列出章节及分块估算

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast;

use epub_translator::application::services::DEFAULT_PROMPT_TEMPLATE;
use epub_translator::application::{
    ChapterCache, ChapterFailurePolicy, ChapterProcessor, ChunkTranslator, OutputFormat,
    ProgressTracker, PromptTemplate, RetryPolicy, ShowChapters, ShowChaptersHandler,
    ShowChaptersResponse, TranslateBook, TranslateBookHandler,
};
use epub_translator::config::{
    load_config_from_path, print_config, validate_config, AppConfig, LlmProvider,
};
use epub_translator::domain::Chunker;
use epub_translator::infrastructure::adapters::{
    create_client, renderers_for, EpubDocument, HtmlTextExtractor,
};
use epub_translator::infrastructure::{
    chapter_cache_path, EventPublisher, JsonChapterStore, JsonProgressStore, TranslationEvent,
};

#[derive(Parser, Debug)]
#[command(name = "epub-translator")]
#[command(version, about = "Translate EPUB books chapter by chapter with LLMs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a book (resumable)
    Translate(TranslateArgs),
    /// List chapters with size and chunk estimates
    ShowChapters(ShowChaptersArgs),
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input EPUB file
    #[arg(long, value_name = "EPUB")]
    input: PathBuf,

    /// Output base path (extension replaced per format)
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    /// Config file path (default: search epub-translator.* / config.*)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting chapter (1-based)
    #[arg(long, default_value_t = 1)]
    from_chapter: usize,

    /// Ending chapter (1-based, inclusive)
    #[arg(long, default_value_t = 9999)]
    to_chapter: usize,

    /// Source language code
    #[arg(long)]
    from_lang: Option<String>,

    /// Target language code
    #[arg(long)]
    to_lang: Option<String>,

    /// File to save translation progress
    #[arg(long)]
    progress_file: Option<PathBuf>,

    /// LLM provider: openai, azure, gemini, ollama
    #[arg(long)]
    llm_provider: LlmProvider,

    /// Maximum chunk size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum attempts per chunk
    #[arg(long)]
    max_retries: Option<u32>,

    /// Extra instructions appended to the prompt
    #[arg(long)]
    extra_prompts: Option<String>,

    /// Output formats (markdown, epub), comma separated
    #[arg(long = "format", value_delimiter = ',')]
    formats: Vec<OutputFormat>,

    /// What to do when a chapter fails: abort or placeholder
    #[arg(long)]
    on_chapter_failure: Option<ChapterFailurePolicy>,
}

#[derive(Args, Debug)]
struct ShowChaptersArgs {
    /// Input EPUB file
    #[arg(long, value_name = "EPUB")]
    input: PathBuf,

    /// Show preview, exact chunk count and chunk warnings
    #[arg(long)]
    detailed: bool,

    /// Model label for the report
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Source language code
    #[arg(long, default_value = "en")]
    from_lang: String,

    /// Target language code
    #[arg(long)]
    to_lang: Option<String>,

    /// Config file path (chunking settings)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Translate(args) => translate(args).await,
        Command::ShowChapters(args) => show_chapters(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// 初始化日志（RUST_LOG 优先）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},epub_translator={}",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();
}

/// 命令行参数覆盖配置
fn apply_overrides(config: &mut AppConfig, args: &TranslateArgs) {
    if let Some(from_lang) = &args.from_lang {
        config.translation.from_lang = from_lang.clone();
    }
    if let Some(to_lang) = &args.to_lang {
        config.translation.to_lang = to_lang.clone();
    }
    if let Some(progress_file) = &args.progress_file {
        config.progress.file = progress_file.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunking.max_chunk_size = chunk_size;
        // 最小块不应超过新的上限
        config.chunking.min_chunk_size = config.chunking.min_chunk_size.min(chunk_size);
    }
    if let Some(max_retries) = args.max_retries {
        config.translation.max_retries = max_retries;
    }
    if let Some(extra_prompts) = &args.extra_prompts {
        config.translation.extra_prompts = extra_prompts.clone();
    }
    if !args.formats.is_empty() {
        config.output.formats = args.formats.iter().map(|f| f.as_str().to_string()).collect();
    }
    if let Some(policy) = args.on_chapter_failure {
        config.translation.on_chapter_failure = policy.as_str().to_string();
    }
}

async fn translate(args: TranslateArgs) -> anyhow::Result<()> {
    let mut config = load_config_from_path(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    validate_config(&config)?;

    init_tracing(&config);
    print_config(&config);

    // 作业开始前完成全部校验
    let client = create_client(&config, args.llm_provider)?;
    let formats = config
        .output
        .formats
        .iter()
        .map(|f| f.parse::<OutputFormat>())
        .collect::<Result<Vec<_>, _>>()?;
    let renderers = renderers_for(&formats)?;
    let failure_policy: ChapterFailurePolicy = config
        .translation
        .on_chapter_failure
        .parse()
        .map_err(anyhow::Error::msg)?;
    let document = Arc::new(EpubDocument::open(&args.input)?);

    let events = EventPublisher::new().arc();
    let reporter = tokio::spawn(report_progress(events.subscribe()));

    let progress_file = config.progress.file.clone();
    let tracker = ProgressTracker::open(
        Arc::new(JsonProgressStore::new(&progress_file)),
        config.progress.auto_save,
        events.clone(),
    )
    .await
    .arc();
    let cache = Arc::new(ChapterCache::new(Arc::new(JsonChapterStore::new(
        chapter_cache_path(&progress_file),
    ))));

    let translation = &config.translation;
    let policy = RetryPolicy::new(
        translation.max_retries,
        Duration::from_secs(translation.retry_delay_secs),
        Duration::from_secs(translation.error_delay_secs),
    );
    let prompt = PromptTemplate::new(
        translation
            .prompt_template
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_TEMPLATE),
        translation.extra_prompts.as_str(),
    );
    let processor = Arc::new(ChapterProcessor::new(
        Chunker::new(config.chunking.to_chunk_config()),
        ChunkTranslator::new(client, policy, prompt),
        Arc::new(HtmlTextExtractor::new()),
        tracker.clone(),
    ));

    let handler = TranslateBookHandler::new(
        document,
        processor,
        tracker.clone(),
        cache,
        renderers,
        failure_policy,
    );
    let command = TranslateBook::new(
        translation.from_lang.as_str(),
        translation.to_lang.as_str(),
        args.output.clone(),
    )
    .with_range(args.from_chapter, args.to_chapter);

    let outcome = tokio::select! {
        result = handler.handle(command) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    drop(handler);
    drop(events);

    let result = match outcome {
        Some(result) => result,
        None => {
            let chapter = tracker.get_progress_summary().await.current_chapter.max(1);
            tracker.mark_interrupted(chapter).await;
            tracing::warn!(chapter, "Translation interrupted by user, progress saved");
            print_resume_hint(chapter, &progress_file);
            reporter.abort();
            anyhow::bail!("interrupted by user");
        }
    };

    // 等待事件流结束后再输出结果
    drop(tracker);
    let _ = reporter.await;

    match result {
        Ok(response) => {
            println!(
                "Translation finished: {} translated, {} skipped",
                response.translated, response.skipped
            );
            if !response.failed.is_empty() {
                println!(
                    "Chapters replaced by placeholders (retried on next run): {:?}",
                    response.failed
                );
            }
            for output in &response.outputs {
                println!("Saved: {}", output.display());
            }
            Ok(())
        }
        Err(e) => {
            if let Some(chapter) = e.resume_chapter() {
                print_resume_hint(chapter, &progress_file);
            }
            Err(e.into())
        }
    }
}

fn print_resume_hint(chapter: usize, progress_file: &std::path::Path) {
    println!(
        "Progress saved to {}. Resume with: --from-chapter {}",
        progress_file.display(),
        chapter
    );
}

/// 订阅进度事件并打印
async fn report_progress(mut rx: broadcast::Receiver<TranslationEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => print_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &TranslationEvent) {
    match event {
        TranslationEvent::TranslationStarted {
            total_chapters,
            completed_chapters,
            resumed,
        } => {
            if *resumed {
                println!(
                    "Resuming translation: {}/{} chapters already done",
                    completed_chapters, total_chapters
                );
            } else {
                println!("Starting translation of {} chapters", total_chapters);
            }
        }
        TranslationEvent::ChapterStarted {
            chapter,
            total_chunks,
            completed_chunks,
            ..
        } => {
            println!(
                "Chapter {}: {} chunks ({} already done)",
                chapter, total_chunks, completed_chunks
            );
        }
        TranslationEvent::ProgressUpdated {
            chapter,
            completed_chunks,
            total_chunks,
        } => {
            println!("  chapter {}: chunk {}/{}", chapter, completed_chunks, total_chunks);
        }
        TranslationEvent::ChapterCompleted {
            chapter,
            completed_chapters,
            total_chapters,
        } => {
            println!(
                "Chapter {} done ({}/{} chapters)",
                chapter, completed_chapters, total_chapters
            );
        }
        TranslationEvent::ErrorRecorded {
            chapter,
            error,
            error_count,
        } => {
            println!("  chapter {}: error #{}: {}", chapter, error_count, error);
        }
        TranslationEvent::JobInterrupted { chapter } => {
            println!("Translation interrupted at chapter {}", chapter);
        }
        TranslationEvent::CleanupCompleted => {
            println!("All chapters translated, progress file removed");
        }
    }
}

async fn show_chapters(args: ShowChaptersArgs) -> anyhow::Result<()> {
    let config = load_config_from_path(args.config.as_deref())?;
    init_tracing(&config);

    let document = Arc::new(
        EpubDocument::open(&args.input)
            .with_context(|| format!("Cannot open {}", args.input.display()))?,
    );
    let handler = ShowChaptersHandler::new(
        document,
        Arc::new(HtmlTextExtractor::new()),
        Chunker::new(config.chunking.to_chunk_config()),
    );

    let mut query = ShowChapters::new(args.model, args.from_lang).detailed(args.detailed);
    if let Some(to_lang) = args.to_lang {
        query = query.with_to_lang(to_lang);
    }

    let response = handler.handle(query).await?;
    print_chapters(&response);
    Ok(())
}

fn print_chapters(response: &ShowChaptersResponse) {
    let total = response.total_chapters();
    if let Some(title) = &response.book_title {
        println!("Book: {}", title);
    }

    for chapter in &response.chapters {
        println!(
            "Chapter {}/{} ({} characters, {} words, ~{} chunks): {}",
            chapter.number,
            total,
            chapter.markup_chars,
            chapter.word_count,
            chapter.estimated_chunks,
            chapter.title
        );

        if let Some(preview) = &chapter.preview {
            println!("{}", preview);
            if let Some(chunk_count) = chapter.chunk_count {
                println!("Chunks: {}", chunk_count);
            }
            for warning in &chapter.warnings {
                println!("Warning: {}", warning);
            }
            println!("{}", "-".repeat(40));
        }
    }

    println!("Total characters in the book: {}", response.total_characters());
    println!("Total words: {}", response.total_words());
    println!(
        "Estimated chunks: {} (model {}, {}{})",
        response.total_estimated_chunks(),
        response.model,
        response.from_lang,
        response
            .to_lang
            .as_deref()
            .map(|to| format!(" → {}", to))
            .unwrap_or_default()
    );
}
