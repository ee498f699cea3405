//! Naukri "Register" link: resolve, verify, and return to the start page.
//!
//! The register button is an anchor with `target="_blank"`. Depending on the
//! deployment it either calls `window.open` or relies on its `href`; either
//! way the destination is loaded into the same window.
//!
//! Usage:
//!   cargo run --example register_layer
//!   cargo run --example register_layer -- --headed --debug
//!   cargo run --example register_layer -- --config run.json

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::{Args, extension_path, firefox_binary};
use nav_resolver::{
    By, CaseRunner, Driver, NavigationCase, TextExpectation, UrlExpectation,
};

// ============================================================================
// Constants
// ============================================================================

const PARENT_URL: &str = "https://www.naukri.com/";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Naukri register layer ===\n");

    let config = args.run_config()?;

    let driver = Driver::builder()
        .binary(firefox_binary())
        .extension(extension_path())
        .command_timeout(config.response_timeout)
        .build()?;

    let mut window = driver.window().window_size(1366, 768);
    if !args.headed {
        window = window.headless();
    }
    let window = window.spawn().await?;
    let page = window.page();
    println!("[Setup] Window spawned (session={})\n", window.session_id());

    let case = NavigationCase::new("register layer", PARENT_URL, By::id("register_Layer"))
        .expect_url(UrlExpectation::contains("/registration/createAccount"))
        .expect_text(TextExpectation::contains("Create your Naukri profile"))
        .return_to_start()
        .ignore_uncaught_exceptions();

    let result = CaseRunner::new(&page)
        .config(config)
        .mode(args.mode())
        .run(&case)
        .await;

    window.close().await?;

    let report = result?;
    println!(
        "[Done] {} passed in {} attempt(s) via {} -> {}",
        report.name,
        report.attempts,
        report.outcome.method,
        report.outcome.resolved_url.as_deref().unwrap_or("-"),
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
