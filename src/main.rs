use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_guard::navigation::{HistoryNavigator, LinkClick, NavigationDecision, Navigator};
use session_guard::notification::{AlertLevel, Notifier};
use session_guard::store::FileTokenStore;
use session_guard::{config, GuardConfig, PageEvent, PageOutcome, SessionGuard};

mod cli;

/// Prints alerts on stderr, the terminal's stand-in for a toast.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, level: AlertLevel, message: &str) {
        match level {
            AlertLevel::Error => eprintln!("❌ {}", message),
            AlertLevel::Warning => eprintln!("⚠️  {}", message),
            AlertLevel::Success | AlertLevel::Info => eprintln!("{}", message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "session_guard=info,sguard=info".into()),
    );
    let json = std::env::var("GUARD_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = run(cfg, args.command).await;
    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Builds a guard for a page currently showing `path`.
fn open_page(cfg: &GuardConfig, path: &str) -> anyhow::Result<(SessionGuard, Arc<HistoryNavigator>)> {
    let store = Arc::new(FileTokenStore::new(&cfg.cookie_file, cfg.cookie_name.clone()));
    let navigator = Arc::new(HistoryNavigator::new(path));
    let guard = SessionGuard::new(cfg.clone(), store, navigator.clone(), Arc::new(StderrNotifier))
        .context("failed to build session guard")?;
    Ok((guard, navigator))
}

fn report_location(start: &str, navigator: &HistoryNavigator) {
    let now = navigator.current_path();
    if now != start {
        println!("location: {} -> {}", start, now);
    }
}

async fn run(cfg: GuardConfig, command: cli::Commands) -> anyhow::Result<()> {
    match command {
        cli::Commands::Login { username, password } => {
            let start = cfg.login_path.clone();
            let (guard, navigator) = open_page(&cfg, &start)?;
            guard.submit_login(&username, &password).await?;
            println!("✅ Signed in as {}", username);
            report_location(&start, &navigator);
        }
        cli::Commands::Logout => {
            let start = cfg.home_path.clone();
            let (guard, navigator) = open_page(&cfg, &start)?;
            guard.logout();
            println!("Signed out");
            report_location(&start, &navigator);
        }
        cli::Commands::Whoami => {
            let (guard, _) = open_page(&cfg, &cfg.home_path)?;
            if guard.get_token().is_none() {
                anyhow::bail!("not signed in (run `sguard login`)");
            }
            let user = guard.whoami().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        cli::Commands::Boot { path } => {
            let (guard, navigator) = open_page(&cfg, &path)?;
            let outcome = guard.handle(PageEvent::Loaded).await;
            if let PageOutcome::Booted { has_token } = outcome {
                println!("token present: {}", has_token);
            }
            println!("state: {:?}", guard.state());
            report_location(&path, &navigator);
        }
        cli::Commands::Click { href, path } => {
            let (guard, navigator) = open_page(&cfg, &path)?;
            let outcome = guard
                .handle(PageEvent::LinkClicked(LinkClick::new(href.clone())))
                .await;
            match outcome {
                PageOutcome::Navigation(NavigationDecision::Allow) => {
                    navigator.assign(&href);
                    println!("navigated to {}", href);
                }
                PageOutcome::Navigation(NavigationDecision::Cancelled) => {
                    println!("navigation to {} cancelled", href);
                }
                PageOutcome::Booted { .. } => {}
            }
            report_location(&path, &navigator);
        }
        cli::Commands::Fetch {
            target,
            method,
            data,
            path,
        } => {
            let (guard, navigator) = open_page(&cfg, &path)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{}'", method))?;

            let mut headers = HeaderMap::new();
            let body = match data {
                Some(raw) => {
                    serde_json::from_str::<serde_json::Value>(&raw)
                        .context("--data must be valid JSON")?;
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    raw.into_bytes()
                }
                None => Vec::new(),
            };

            let resp = guard.client().send_raw(method, &target, headers, body).await?;
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            println!("{}", status);
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                Err(_) if !text.is_empty() => println!("{}", text),
                Err(_) => {}
            }
            report_location(&path, &navigator);
        }
    }
    Ok(())
}
