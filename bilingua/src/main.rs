//! bilingua - Build bilingual (original + contemporary translation) e-books
//! and audiobooks from EPUB files

mod audio;
mod bilingual;
mod config;
mod diagnostics;
mod epub;
mod headers;
mod llm;
mod progress;
mod render;
mod summary;
mod text;
mod translate;
mod tts;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::BilinguaConfig;
use llm::LlmClient;
use llm_client::{Config, ModelPreset, RetryPolicy};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "bilingua")]
#[command(
    about = "Build bilingual e-books and audiobooks from EPUB files",
    long_about = "Translates an EPUB section by section into an interleaved bilingual text file, then renders it as EPUB, HTML or narrated MP3"
)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Model preset to use (overrides default from config)
    #[arg(short, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an EPUB into a bilingual text file
    Translate {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Translate at most this many sections
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start fresh, ignore saved progress
        #[arg(long)]
        no_resume: bool,

        /// Output file (default: <epub-name>_Bilingual.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize the chapters of a bilingual file
    SummarizeChapters {
        /// Bilingual text file
        input: PathBuf,

        /// First chapter title to summarize
        #[arg(long)]
        start: Option<String>,

        /// Last chapter title to summarize
        #[arg(long)]
        end: Option<String>,

        /// Also write a short literary analysis per chapter
        #[arg(long)]
        analysis: bool,

        /// Book title used in prompts
        #[arg(long)]
        book_title: Option<String>,

        /// Output file (default: <input-name>.out)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write narrative summaries per canto
    SummarizeCantos {
        /// Bilingual text file with canto headers
        input: PathBuf,

        /// First canto, e.g. "Inferno • Canto I"
        #[arg(long)]
        start: Option<String>,

        /// Last canto
        #[arg(long)]
        end: Option<String>,

        /// Output file (default: <input-name>_canto_summaries.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add section ranges to canto summary headers that lack them
    Rehabilitate {
        /// Bilingual text file with canto headers
        input: PathBuf,

        /// Canto summary file
        summaries: PathBuf,
    },
    /// Insert canto headers found in the source EPUB into a bilingual file
    InsertHeaders {
        /// Bilingual text file
        input: PathBuf,

        /// Source EPUB
        #[arg(long)]
        epub: PathBuf,

        /// Output file (default: <input-name>_with_headers.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a bilingual file as an EPUB
    Epub {
        /// Bilingual text file
        input: PathBuf,

        /// Chapter summary file to embed
        #[arg(long)]
        summaries: Option<PathBuf>,

        /// Merge line breaks inside sentences
        #[arg(long)]
        smooth_breaks: bool,

        /// Book title (default: TITLE from the file)
        #[arg(long)]
        title: Option<String>,

        /// Book author (default: AUTHOR from the file)
        #[arg(long)]
        author: Option<String>,

        /// Output file (default: <input-name>.epub)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a bilingual file as HTML pages
    Html {
        /// Bilingual text file
        input: PathBuf,

        /// Canto summary file to embed
        #[arg(long)]
        summaries: Option<PathBuf>,

        /// Directory for the pages (default: next to the input)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Convert an EPUB into Jekyll pages zipped as HTMLZ
    Htmlz {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Stylesheet to ship (default: built-in)
        #[arg(long)]
        css: Option<PathBuf>,

        /// Directory for the archive and unpacked pages (default: next to the EPUB)
        #[arg(long)]
        output_folder: Option<PathBuf>,
    },
    /// Narrate a bilingual file, original then translation
    Audio {
        /// Bilingual text file
        input: PathBuf,

        /// First segment to narrate (1-based)
        #[arg(long, default_value_t = 1)]
        start_from: usize,
    },
    /// Narrate the original chapters as one MP3 with chapter markers
    ChapterAudio {
        /// Bilingual text file
        input: PathBuf,

        /// Output file (default: <input-name>_audiobook.mp3)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Narrate only the first N chapters
        #[arg(short = 'n', long)]
        num_chapters: Option<usize>,

        /// Estimate chapter starts without synthesizing
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that the configured model answers
    Check,
    /// List models available to the configured provider
    Models,
    /// Preview extracted text without calling a model
    Peek {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Characters to show
        #[arg(long, default_value_t = 1000)]
        chars: usize,
    },
    /// Translate the first substantial document as a trial
    Sample {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Output file (default: <epub-name>_sample.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// List available presets
    List,
    /// Set the default model preset
    SetDefault {
        /// Name of the preset to use as default
        preset: String,
    },
    /// Add a new preset
    AddPreset {
        /// Preset name
        name: String,
        /// Provider (gemini, anthropic, openai, openrouter, cerebras)
        #[arg(short, long)]
        provider: String,
        /// Model identifier
        #[arg(short = 'M', long)]
        model: String,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "warn,bilingua=debug,llm_client=debug"
    } else {
        "warn,bilingua=info,llm_client=info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

fn read_bilingual(path: &Path) -> Result<bilingual::BilingualText> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(bilingual::parse(&content))
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bilingual".to_string())
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("LLM config file: {}", Config::config_path()?.display());
            println!();
            println!("{:#?}", config);
            println!();

            let settings = BilinguaConfig::load()?;
            println!("bilingua config file: {}", BilinguaConfig::config_path()?.display());
            println!();
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let current_default = config.get_default_for_program(llm::PROGRAM);
            let mut names: Vec<&String> = config.presets.keys().collect();
            names.sort();
            println!("Available presets:");
            for name in names {
                let preset = &config.presets[name];
                let default_marker = if name == current_default {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} / {}{}",
                    name, preset.provider, preset.model, default_marker
                );
            }
        }
        ConfigAction::SetDefault { preset } => {
            let mut config = Config::load()?;
            config.get_preset(preset)?;
            config
                .defaults
                .insert(llm::PROGRAM.to_string(), preset.clone());
            config.save()?;
            println!("Default preset for {} set to: {}", llm::PROGRAM, preset);
        }
        ConfigAction::AddPreset {
            name,
            provider,
            model,
        } => {
            let mut config = Config::load()?;
            config.presets.insert(
                name.clone(),
                ModelPreset {
                    provider: provider.clone(),
                    model: model.clone(),
                },
            );
            config.save()?;
            println!("Added preset: {}", name);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let settings = BilinguaConfig::load().context("Failed to load configuration")?;
    let model = args.model.as_deref();

    match args.command {
        Commands::Config { action } => handle_config_command(&action)?,

        Commands::Translate {
            epub_file,
            limit,
            no_resume,
            output,
        } => {
            ensure_exists(&epub_file)?;
            let client = LlmClient::new(model, settings.retry.policy())?;
            let translator = translate::Translator::new(&client, &settings.translation);
            let options = translate::TranslateOptions {
                limit,
                restart: no_resume,
                output,
            };
            let report = translator.run(&epub_file, &options).await?;

            eprintln!();
            eprintln!(
                "Translated {} section(s); next section {} of {}",
                report.translated, report.next_section, report.total_sections
            );
            if !report.failed.is_empty() {
                eprintln!("Failed sections: {:?}", report.failed);
            }
            match report.stop {
                translate::StopReason::Finished => {
                    println!("Output: {}", report.output.display());
                }
                translate::StopReason::QuotaExhausted => {
                    println!(
                        "Quota exhausted. Progress saved; run again later to resume at section {}.",
                        report.next_section
                    );
                }
            }
        }

        Commands::SummarizeChapters {
            input,
            start,
            end,
            analysis,
            book_title,
            output,
        } => {
            ensure_exists(&input)?;
            let text = read_bilingual(&input)?;
            if !text.has_chapters() {
                anyhow::bail!("No chapter boundaries found in {}", input.display());
            }
            let client = LlmClient::new(model, settings.retry.policy())?;

            let book_title = book_title
                .or_else(|| settings.summary.book_title.clone())
                .or_else(|| text.title.clone())
                .unwrap_or_else(|| stem_of(&input).replace('_', " "));
            let output = output.unwrap_or_else(|| summary::chapters::default_output_path(&input));
            let source_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let range = summary::chapters::ChapterRange { start, end };

            let report = summary::chapters::ChapterSummarizer::new(&client, &settings.summary, &book_title)
                .with_analysis(analysis)
                .run(&text, &source_name, &range, &output)
                .await?;

            println!(
                "Wrote {} chapter summar{} to {}",
                report.written,
                if report.written == 1 { "y" } else { "ies" },
                report.output.display()
            );
            if report.quota_exhausted {
                println!("Stopped early: quota exhausted.");
            }
        }

        Commands::SummarizeCantos {
            input,
            start,
            end,
            output,
        } => {
            ensure_exists(&input)?;
            let text = read_bilingual(&input)?;
            let client = LlmClient::new(model, settings.retry.policy())?;
            let output = output.unwrap_or_else(|| summary::cantos::default_output_path(&input));

            let report = summary::cantos::summarize_cantos(
                &client,
                &settings.summary,
                &text,
                start.as_deref(),
                end.as_deref(),
                &output,
            )
            .await?;

            println!("Wrote {} canto summaries to {}", report.written, report.output.display());
            if report.quota_exhausted {
                println!("Stopped early: quota exhausted.");
            }
        }

        Commands::Rehabilitate { input, summaries } => {
            ensure_exists(&input)?;
            ensure_exists(&summaries)?;
            let text = read_bilingual(&input)?;
            let output = summary::cantos::rehabilitated_path(&summaries);
            let changed = summary::cantos::rehabilitate(&text, &summaries, &output)?;
            println!("Updated {} header(s); wrote {}", changed, output.display());
        }

        Commands::InsertHeaders { input, epub, output } => {
            ensure_exists(&input)?;
            ensure_exists(&epub)?;
            let book = epub::parse_epub(&epub)?;
            let literals = epub::extract_canto_literals(&book);
            eprintln!("Found {} canto headings in {}", literals.len(), epub.display());

            let output = output.unwrap_or_else(|| headers::default_output_path(&input));
            let report = headers::insert_into_file(&input, &literals, &output)?;

            for failure in &report.failures {
                eprintln!("Could not place header: {}", failure);
            }
            if report.present > 0 {
                eprintln!("{} headers were already in place", report.present);
            }
            println!(
                "Inserted {} of {} headers into {}",
                report.inserted,
                literals.len(),
                output.display()
            );
        }

        Commands::Epub {
            input,
            summaries,
            smooth_breaks,
            title,
            author,
            output,
        } => {
            ensure_exists(&input)?;
            let output = output.unwrap_or_else(|| input.with_extension("epub"));
            let options = render::epub::EpubOptions {
                title,
                author,
                summaries,
                smooth_breaks,
            };
            let pages = render::epub::render_epub(&input, &output, &options)?;
            println!("Wrote {} ({} page(s))", output.display(), pages);
        }

        Commands::Html {
            input,
            summaries,
            output_dir,
        } => {
            ensure_exists(&input)?;
            let out_dir = output_dir.unwrap_or_else(|| parent_of(&input));
            let written = render::html::render_html(&input, &out_dir, summaries.as_deref())?;
            println!("Wrote {} page(s) to {}", written.len(), out_dir.display());
        }

        Commands::Htmlz {
            epub_file,
            css,
            output_folder,
        } => {
            ensure_exists(&epub_file)?;
            let out_dir = output_folder.unwrap_or_else(|| parent_of(&epub_file));
            let report = render::htmlz::render_htmlz(&epub_file, css.as_deref(), &out_dir)?;
            println!("Wrote {} ({} chapter(s))", report.archive.display(), report.chapters);
            println!("Unpacked to {}", report.unpacked.display());
        }

        Commands::Audio { input, start_from } => {
            ensure_exists(&input)?;
            let text = read_bilingual(&input)?;
            let tools = audio::assembler::AudioTools::from_config(&settings.audio);
            if !tools.is_available() {
                anyhow::bail!("ffmpeg not found at {}", settings.audio.ffmpeg.display());
            }
            let tts = tts::create_backend(&settings.audio)?;

            let output = audio::interleaved::build_interleaved(
                tts.as_ref(),
                &tools,
                &text,
                &input,
                &settings.audio,
                settings.retry.attempts,
                start_from,
            )
            .await?;
            println!("Audiobook: {}", output.display());
        }

        Commands::ChapterAudio {
            input,
            output,
            num_chapters,
            dry_run,
        } => {
            ensure_exists(&input)?;
            let text = read_bilingual(&input)?;
            let output = output
                .unwrap_or_else(|| input.with_file_name(format!("{}_audiobook.mp3", stem_of(&input))));

            let report = if dry_run {
                audio::chapters::dry_run(&text, &settings.audio, num_chapters)?
            } else {
                let tools = audio::assembler::AudioTools::from_config(&settings.audio);
                if !tools.is_available() {
                    anyhow::bail!("ffmpeg not found at {}", settings.audio.ffmpeg.display());
                }
                let tts = tts::create_backend(&settings.audio)?;
                audio::chapters::build_chapter_audio(
                    tts.as_ref(),
                    &tools,
                    &text,
                    &output,
                    &settings.audio,
                    settings.retry.attempts,
                    num_chapters,
                )
                .await?
            };

            for skipped in &report.skipped {
                eprintln!("Skipped {} (synthesis failed)", skipped);
            }
            if let Some(path) = &report.output {
                println!("Audiobook: {}", path.display());
                println!("Chapter map: {}", audio::chapters::map_path(path).display());
            }
            println!();
            println!("{}", audio::chapters::chapter_map_js(&report.chapters));
        }

        Commands::Check => {
            let client = LlmClient::new(model, RetryPolicy::none())?;
            eprintln!("Checking {} ({})...", client.provider().name(), client.model());
            let outcome = diagnostics::check(&client).await;
            println!("{}", outcome.describe());
            if !outcome.is_ready() {
                std::process::exit(1);
            }
        }

        Commands::Models => {
            let client = LlmClient::new(model, RetryPolicy::none())?;
            let models = diagnostics::models(&client).await?;
            println!("Models available to {}:", client.provider().name());
            for name in models {
                println!("  {}", name);
            }
        }

        Commands::Peek { epub_file, chars } => {
            ensure_exists(&epub_file)?;
            let preview = epub::preview(&epub_file, chars)?;
            println!("Title: {}", preview.title);
            println!("Document: {}", preview.document_id);
            println!("Extracted {} characters", preview.char_count);
            println!();
            println!("{}", preview.excerpt);
        }

        Commands::Sample { epub_file, output } => {
            ensure_exists(&epub_file)?;
            let client = LlmClient::new(model, settings.retry.policy())?;
            let report =
                diagnostics::sample(&client, &settings.translation, &epub_file, output.as_deref()).await?;
            eprintln!(
                "Translated document {} ({} chars)",
                report.document_id, report.source_chars
            );
            println!("{}", diagnostics::preview_of(&report));
            println!();
            println!("Saved to {}", report.output.display());
        }
    }

    Ok(())
}
