//! Resolution chain benchmark suite.
//!
//! Measures the resolver's own overhead per branch on the in-memory context:
//! - scripted-open and href-fallback (resolve plus one load)
//! - a full case run with URL and content assertions
//!
//! Direct navigation and unresolved outcomes are dominated by the settle
//! window, so they are not measured.
//!
//! Run with: cargo bench --bench resolve
//! Results saved to: target/criterion/

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use nav_resolver::context::ClickBehavior;
use nav_resolver::{
    AutomationContext, By, CaseRunner, ClickTarget, LoadOptions, LocateOptions, MemoryContext,
    MemoryElement, MemoryPage, NavigationCase, NavigationResolver, TextExpectation,
    UrlExpectation,
};

// ============================================================================
// Fixtures
// ============================================================================

const HOME: &str = "https://www.naukri.com/";
const REGISTER: &str = "https://www.naukri.com/registration/createAccount";

/// Number of decoy elements on the start page.
const PAGE_SIZES: &[usize] = &[10, 100, 1000];

fn site(decoys: usize, behavior: ClickBehavior) -> MemoryContext {
    let mut home = MemoryPage::new(HOME);
    for i in 0..decoys {
        home = home.element(
            MemoryElement::new(By::css(format!("a.job-{i}"))).href(format!("/job/{i}")),
        );
    }
    home = home.element(
        MemoryElement::new(By::id("register_Layer"))
            .href("/registration/createAccount")
            .target("_blank")
            .on_click(behavior),
    );

    MemoryContext::new()
        .with_page(home)
        .with_page(MemoryPage::new(REGISTER).text("Create your Naukri profile"))
}

async fn resolve_once(ctx: &MemoryContext, resolver: &NavigationResolver) {
    ctx.load_url(HOME, &LoadOptions::tolerant(Duration::from_secs(5)))
        .await
        .expect("load");
    let target = ClickTarget::locate(
        ctx,
        By::id("register_Layer"),
        &LocateOptions::new(Duration::from_secs(1)),
    )
    .await
    .expect("locate");
    resolver.resolve(&target, ctx).await.expect("resolve");
}

// ============================================================================
// Benchmark: Resolution Branches
// ============================================================================

fn bench_branches(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let resolver = NavigationResolver::new();

    let mut group = c.benchmark_group("resolve");

    for &size in PAGE_SIZES {
        let scripted = site(size, ClickBehavior::ScriptedOpen(REGISTER.to_string()));
        group.bench_with_input(BenchmarkId::new("scripted_open", size), &size, |b, _| {
            b.to_async(&rt).iter(|| resolve_once(&scripted, &resolver));
        });

        let href = site(size, ClickBehavior::Default);
        group.bench_with_input(BenchmarkId::new("href_fallback", size), &size, |b, _| {
            b.to_async(&rt).iter(|| resolve_once(&href, &resolver));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Case Runner
// ============================================================================

fn bench_case(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let ctx = site(100, ClickBehavior::ScriptedOpen(REGISTER.to_string()));
    let case = NavigationCase::new("register layer", HOME, By::id("register_Layer"))
        .expect_url(UrlExpectation::contains("/registration/createAccount"))
        .expect_text(TextExpectation::contains_ignore_case("naukri profile"))
        .return_to_start();

    c.bench_function("case_run", |b| {
        b.to_async(&rt).iter(|| async {
            CaseRunner::new(&ctx).run(&case).await.expect("case passes");
        });
    });
}

criterion_group!(benches, bench_branches, bench_case);
criterion_main!(benches);
