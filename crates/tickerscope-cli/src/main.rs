//! Command-line interface for tickerscope
//!
//! ```bash
//! # One-shot lookup
//! tickerscope AAPL --lang zh --window-days 7
//!
//! # Interactive prompt
//! tickerscope
//! ```

mod render;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tickerscope_lookup::{CachedLookup, Language, LookupConfig, LookupService};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tickerscope")]
#[command(about = "Session-aware stock quotes and translated news", long_about = None)]
struct Args {
    /// Ticker to look up; omit for the interactive prompt
    ticker: Option<String>,

    /// Language news is translated into (e.g. zh, en)
    #[arg(short, long)]
    lang: Option<String>,

    /// Trailing news window in days
    #[arg(short, long)]
    window_days: Option<u32>,

    /// Maximum number of news items (0 for no limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<LookupConfig> {
        let mut config = LookupConfig::default().with_env()?;
        if let Some(lang) = &self.lang {
            config.default_language = Language::from_code(lang);
        }
        if let Some(days) = self.window_days {
            config.window_days = days;
        }
        if let Some(limit) = self.limit {
            config.max_news_items = (limit > 0).then_some(limit);
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_banner(language: &Language) {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║                        tickerscope                           ║
║                                                              ║
║  Type a ticker (AAPL, BRK.B) to see its quote and news.      ║
║                                                              ║
║  Commands:                                                   ║
║    /lang <code>   - 切换新闻语言 (Switch news language)      ║
║    /clear         - 清空缓存 (Clear cached results)          ║
║    /help          - 显示帮助 (Help)                          ║
║    /exit          - 退出 (Exit)                              ║
╚══════════════════════════════════════════════════════════════╝
  News language: {language}
"#
    );
}

fn print_result(result: &tickerscope_lookup::LookupResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", render::render_json(result)?);
    } else {
        println!("{}", render::render_text(result));
    }
    Ok(())
}

async fn run_repl(cache: CachedLookup, mut language: Language, json: bool) -> anyhow::Result<()> {
    print_banner(&language);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{}] > ", language.code());
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.split_once(' ').unwrap_or((input, "")) {
            ("/exit" | "/quit", _) => {
                println!("Goodbye!");
                break;
            }
            ("/help", _) => print_banner(&language),
            ("/clear", _) => {
                cache.clear().await;
                println!("Cache cleared.\n");
            }
            ("/lang", code) if !code.trim().is_empty() => {
                language = Language::from_code(code);
                println!("News language: {language}\n");
            }
            ("/lang", _) => println!("Usage: /lang <code>\n"),
            (cmd, _) if cmd.starts_with('/') => println!("Unknown command {cmd}; try /help\n"),
            (ticker, _) => match cache.lookup(ticker, &language, None).await {
                Ok(result) => print_result(&result, json)?,
                Err(e) => eprintln!("Error: {e}\n"),
            },
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let app = tickerscope_utils::AppConfig::from_env()?;
    tickerscope_utils::init_tracing_with("warn", args.json_logs || app.json_logs);

    let config = args.config()?;
    let service = LookupService::from_config(&config)?;
    let language = config.default_language.clone();

    info!(environment = %app.environment, "Starting tickerscope");

    match &args.ticker {
        Some(ticker) => {
            let result = service.lookup(ticker, &language, None).await?;
            print_result(&result, args.json)?;
        }
        None => {
            let cache = CachedLookup::new(service, config.cache_ttl);
            run_repl(cache, language, args.json).await?;
        }
    }

    Ok(())
}
