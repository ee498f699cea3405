//! Naukri "Explore top companies" link with a content fallback.
//!
//! When neither `window.open` nor an `href` reveals the destination and the
//! URL does not change, the case falls back to checking the page text.
//!
//! Usage:
//!   cargo run --example explore_companies
//!   cargo run --example explore_companies -- --headed

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::{Args, extension_path, firefox_binary};
use nav_resolver::{
    By, CaseRunner, Driver, NavigationCase, NavigationMethod, TextExpectation, UrlExpectation,
};

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
    println!("=== Naukri explore companies ===\n");

    let config = args.run_config()?;

    let driver = Driver::builder()
        .binary(firefox_binary())
        .extension(extension_path())
        .build()?;

    let builder = driver.window().window_size(1366, 768);
    let window = if args.headed {
        builder.spawn().await?
    } else {
        builder.headless().spawn().await?
    };
    let page = window.page();

    let case = NavigationCase::new(
        "explore companies",
        "https://www.naukri.com/",
        By::css("a[title='Explore top companies hiring on Naukri']"),
    )
    .base_url("https://www.naukri.com")
    .allow_hidden()
    .expect_url(UrlExpectation::contains("/companies-hiring-in-india"))
    .expect_text(TextExpectation::any_of_ignore_case([
        "Top Companies",
        "Companies Hiring",
    ])?)
    .ignore_uncaught_exceptions();

    let result = CaseRunner::new(&page)
        .config(config)
        .mode(args.mode())
        .run(&case)
        .await;

    window.close().await?;

    let report = result?;
    match report.outcome.method {
        NavigationMethod::Unresolved => {
            println!("[Done] No navigation signal; page content matched instead");
        }
        method => println!(
            "[Done] Resolved via {method}: {}",
            report.outcome.resolved_url.as_deref().unwrap_or("-")
        ),
    }
    Ok(())
}
