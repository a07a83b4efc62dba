// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use bulkpod::{
    BatchReport, DEFAULT_OUTPUT_DIR, DownloadOptions, Feed, HttpClient, NoopReporter,
    ProgressEvent, ProgressReporter, ReqwestClient, Session, SharedProgressReporter, download_all,
    logging,
};

// Emoji with fallback for terminals without Unicode support
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static RETRY: Emoji<'_, '_> = Emoji("🔁 ", "[~] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[-] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

const HEADER: &str = "---------------( bulkpod )---------------";

/// Interactively load a podcast feed and download every episode
#[derive(Parser, Debug)]
#[command(name = "bulkpod")]
#[command(about = "Interactively load a podcast feed and download every episode")]
#[command(version)]
struct Args {
    /// Directory downloaded episodes are saved to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// RSS feed URL or path to load before showing the menu
    #[arg(short, long)]
    feed: Option<String>,

    /// Quiet mode - suppress progress bars
    #[arg(short, long)]
    quiet: bool,
}

/// Progress reporter drawing one indicatif bar for the episode in flight
struct IndicatifReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, content_length: Option<u64>, message: String) {
        let bar = match content_length {
            Some(total) => {
                let style = ProgressStyle::default_bar()
                    .template(&format!(
                        "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{bytes_per_sec}} {{wide_msg}}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░");
                let bar = ProgressBar::new(total);
                bar.set_style(style);
                bar
            }
            // Unknown size: spinner with a running byte count
            None => {
                let style = ProgressStyle::default_spinner()
                    .template(&format!(
                        "  {DOWNLOAD}{{spinner:.green}} {{bytes}} {{bytes_per_sec}} {{wide_msg}}"
                    ))
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                let bar = ProgressBar::new_spinner();
                bar.set_style(style);
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        bar.set_message(message);

        let mut slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.replace(bar) {
            old.finish_and_clear();
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarting {
                feed_title,
                total_episodes,
            } => {
                println!(
                    "{HEADPHONES}{} • {} episodes\n",
                    feed_title.bold().green(),
                    total_episodes.to_string().cyan()
                );
            }

            ProgressEvent::EpisodeSkipped { episode_title, .. } => {
                println!(
                    "{SKIP}Skipping {} as it's already downloaded.",
                    episode_title.dimmed()
                );
            }

            ProgressEvent::DownloadStarting {
                episode_index,
                total_episodes,
                episode_title,
                attempt,
                content_length,
            } => {
                let mut message = format!(
                    "[{}/{}] {}",
                    (episode_index + 1).to_string().cyan(),
                    total_episodes.to_string().cyan(),
                    truncate_title(&episode_title, 50)
                );
                if attempt > 1 {
                    message.push_str(&format!(" (attempt {attempt})").yellow().to_string());
                }
                self.start_bar(content_length, message);
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                let slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(bar) = slot.as_ref() {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                }
            }

            ProgressEvent::RetryScheduled {
                episode_title,
                attempt,
                max_attempts,
                error,
                ..
            } => {
                if let Some(bar) = self.take_bar() {
                    bar.abandon();
                }
                println!(
                    "{RETRY}Error downloading {}: {}",
                    episode_title.yellow(),
                    error.dimmed()
                );
                println!("{}", retry_notice(attempt, max_attempts));
            }

            ProgressEvent::DownloadCompleted { episode_title, .. } => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                println!("{SUCCESS}Downloaded: {}", episode_title.green());
            }

            ProgressEvent::DownloadFailed {
                episode_title,
                error,
                ..
            } => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                println!(
                    "{FAILURE}Failed to download {}: {}",
                    episode_title.red(),
                    error.red()
                );
            }

            ProgressEvent::BatchCompleted {
                succeeded,
                skipped,
                failed,
            } => {
                println!(
                    "\n{PARTY}{} {} downloaded, {} skipped, {} failed",
                    "All episodes processed!".bold().green(),
                    succeeded.to_string().green().bold(),
                    skipped.to_string().yellow(),
                    if failed > 0 {
                        failed.to_string().red().bold()
                    } else {
                        failed.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// The interactive menu and the state it works on
struct Shell<C> {
    client: C,
    session: Session,
    options: DownloadOptions,
    reporter: SharedProgressReporter,
    term: Term,
    input: Lines<BufReader<Stdin>>,
}

enum MenuChoice {
    LoadFeed,
    Download,
    Exit,
    Invalid,
}

impl MenuChoice {
    fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => MenuChoice::LoadFeed,
            "2" => MenuChoice::Download,
            "3" => MenuChoice::Exit,
            _ => MenuChoice::Invalid,
        }
    }
}

impl<C: HttpClient> Shell<C> {
    fn new(client: C, options: DownloadOptions, reporter: SharedProgressReporter) -> Self {
        Self {
            client,
            session: Session::new(),
            options,
            reporter,
            term: Term::stdout(),
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn run(&mut self) -> Result<()> {
        loop {
            self.clear_screen();
            println!("{}", HEADER.bold().magenta());
            println!("1. Enter RSS feed and test feed information");
            println!("2. Download episodes");
            println!("3. Exit");
            println!("\nRSS feed: {}", self.session.summary_line().cyan());

            // End of input behaves like choosing exit
            let Some(choice) = self.prompt("\nPlease select an option (1/2/3): ").await? else {
                break;
            };

            match MenuChoice::parse(&choice) {
                MenuChoice::LoadFeed => {
                    let Some(source) = self.prompt("\nEnter the RSS feed URL: ").await? else {
                        break;
                    };
                    if self.load_feed(source.trim()).await? {
                        println!("\n{}", "RSS feed test completed successfully!".green());
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
                MenuChoice::Download => {
                    self.clear_screen();
                    println!("{}\n", HEADER.bold().magenta());
                    self.download().await?;
                }
                MenuChoice::Exit => break,
                MenuChoice::Invalid => {
                    println!("\n{}", "(!) Invalid option! Try again.".red());
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        println!("\nExiting bulkpod. Happy listening!\n");
        Ok(())
    }

    /// Load a feed into the session and show its details.
    ///
    /// Returns whether a feed was loaded.
    async fn load_feed(&mut self, source: &str) -> Result<bool> {
        match self.session.load(&self.client, source).await {
            Ok(feed) => {
                let info = show_information(feed);
                self.clear_screen();
                println!("{}", HEADER.bold().magenta());
                println!("{info}");
                self.pause().await?;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "Feed could not be loaded");
                println!(
                    "\n{}",
                    "(!) Invalid RSS feed URL. Please check the URL and try again.".red()
                );
                println!("    {}", e.to_string().dimmed());
                self.pause().await?;
                Ok(false)
            }
        }
    }

    async fn download(&mut self) -> Result<()> {
        let Some(feed) = self.session.feed() else {
            println!("\n{}", "(!) Please test an RSS feed first (Option 1)!".red());
            tokio::time::sleep(Duration::from_secs(1)).await;
            return Ok(());
        };

        match download_all(&self.client, feed, &self.options, self.reporter.clone()).await {
            Ok(report) => print_report(&report),
            Err(e) => {
                tracing::error!(error = %e, "Batch download could not start");
                println!("\n{FAILURE}{}", e.to_string().red());
            }
        }
        println!(
            "\n{FOLDER}Output: {}",
            self.options.output_dir.display().to_string().cyan()
        );
        self.pause().await
    }

    async fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        print!("{message}");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        self.input
            .next_line()
            .await
            .context("Failed to read from stdin")
    }

    async fn pause(&mut self) -> Result<()> {
        self.prompt("\nPress Enter to return to the main menu...")
            .await
            .map(|_| ())
    }

    fn clear_screen(&self) {
        // Not a terminal, nothing to clear
        let _ = self.term.clear_screen();
    }
}

fn show_information(feed: &Feed) -> String {
    format!(
        "\nShow Information:\n\
         -----------------\n\
         {:>16}: {}\n\
         {:>16}: {}\n\
         {:>16}: {}\n\
         \nShow Description:\n\
         -----------------\n\
         \"{}\"",
        "Title",
        feed.title.bold(),
        "# of Episodes",
        feed.episode_count().to_string().cyan(),
        "Copyright",
        feed.copyright,
        feed.description
    )
}

/// Line announcing the attempt that follows `failed_attempt`
fn retry_notice(failed_attempt: u32, max_attempts: u32) -> String {
    format!(
        "   Retrying, attempt {}/{}...",
        failed_attempt + 1,
        max_attempts
    )
}

fn print_report(report: &BatchReport) {
    if report.succeeded > 0 {
        println!(
            "{DOWNLOAD}{} written this run",
            HumanBytes(report.bytes_downloaded)
        );
    }

    if report.all_succeeded() {
        println!("{}", "All episodes were downloaded successfully.".green());
        return;
    }

    println!("\n{}", "The following episodes failed to download:".red().bold());
    for title in &report.failed {
        println!("  {CROSS}{}", title.yellow());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging().context("Failed to initialize logging")?;

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let options = DownloadOptions {
        output_dir: args.output_dir,
        ..Default::default()
    };

    let mut shell = Shell::new(ReqwestClient::new(), options, reporter);

    if let Some(source) = args.feed.as_deref() {
        shell.load_feed(source).await?;
    }

    shell.run().await
}
