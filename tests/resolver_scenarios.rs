//! Resolution chain against the in-memory context.
//!
//! Run with: cargo test --test resolver_scenarios

use std::time::Duration;

use nav_resolver::context::ClickBehavior;
use nav_resolver::{
    AutomationContext, By, ClickTarget, Error, LoadOptions, LocateOptions, MemoryContext,
    MemoryElement, MemoryPage, NavigationMethod, NavigationResolver,
};
use proptest::prelude::*;
use url::Url;

// ============================================================================
// Fixtures
// ============================================================================

const HOME: &str = "https://www.naukri.com/";
const REGISTER: &str = "https://www.naukri.com/registration/createAccount";
const COMPANIES: &str = "https://www.naukri.com/companies-hiring-in-india";

fn register_link() -> By {
    By::id("register_Layer")
}

fn companies_link() -> By {
    By::css("a[title='Explore top companies hiring on Naukri']")
}

fn resolver() -> NavigationResolver {
    NavigationResolver::new().settle(Duration::from_millis(500))
}

fn locate_options() -> LocateOptions {
    LocateOptions::new(Duration::from_secs(2))
}

fn home_with(element: MemoryElement) -> MemoryContext {
    MemoryContext::new()
        .with_page(MemoryPage::new(HOME).element(element))
        .with_page(MemoryPage::new(REGISTER).text("Create your Naukri profile"))
        .with_page(MemoryPage::new(COMPANIES).text("Top companies hiring now"))
}

async fn open_home(ctx: &MemoryContext) {
    ctx.load_url(HOME, &LoadOptions::tolerant(Duration::from_secs(5)))
        .await
        .expect("home should load");
}

// ============================================================================
// Resolution Chain
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_href_fallback_joins_base() {
    let ctx = home_with(MemoryElement::new(register_link()).href("/registration/createAccount"));
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver()
        .base_url(Url::parse(HOME).expect("url"))
        .resolve(&target, &ctx)
        .await
        .expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::HrefFallback);
    assert_eq!(outcome.resolved_url.as_deref(), Some(REGISTER));
    assert_eq!(outcome.url_before_click, HOME);
    assert!(!outcome.target_removed);
    assert_eq!(ctx.current_url().await.expect("url"), REGISTER);
}

#[tokio::test(start_paused = true)]
async fn test_scripted_open_strips_target() {
    let ctx = home_with(
        MemoryElement::new(companies_link())
            .href("/companies-hiring-in-india")
            .target("_blank")
            .on_click(ClickBehavior::ScriptedOpen(COMPANIES.to_string())),
    );
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, companies_link(), &locate_options())
        .await
        .expect("locate");
    assert_eq!(target.target(), Some("_blank"));

    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::ScriptedOpen);
    assert_eq!(outcome.resolved_url.as_deref(), Some(COMPANIES));
    assert!(outcome.target_removed);
    assert_eq!(
        ctx.removed_attributes(),
        vec![(companies_link(), "target".to_string())]
    );
    assert!(ctx.opened_windows().is_empty());
    assert_eq!(ctx.current_url().await.expect("url"), COMPANIES);
    assert_eq!(
        ctx.page_text().await.expect("text"),
        "Top companies hiring now"
    );
}

#[tokio::test(start_paused = true)]
async fn test_direct_navigation_follows_url_change() {
    let ctx = home_with(
        MemoryElement::new(register_link())
            .on_click(ClickBehavior::Navigate("/registration/createAccount".into())),
    );
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::DirectNavigation);
    assert_eq!(outcome.resolved_url.as_deref(), Some(REGISTER));
    // The click itself loaded the page; the resolver adds no load.
    assert_eq!(ctx.load_history(), vec![HOME, REGISTER]);
}

#[tokio::test(start_paused = true)]
async fn test_client_side_route_counts_as_direct_navigation() {
    let ctx = home_with(
        MemoryElement::new(register_link())
            .on_click(ClickBehavior::PushState("/registration/createAccount".into())),
    );
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::DirectNavigation);
    assert_eq!(outcome.resolved_url.as_deref(), Some(REGISTER));
    assert_eq!(ctx.load_history(), vec![HOME]);
}

#[tokio::test(start_paused = true)]
async fn test_no_navigation_is_unresolved() {
    let ctx = home_with(MemoryElement::new(register_link()));
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::Unresolved);
    assert_eq!(outcome.resolved_url, None);
    assert!(!outcome.is_resolved());
    assert!(matches!(
        outcome.require_url(),
        Err(Error::Unresolved { .. })
    ));
    assert_eq!(ctx.current_url().await.expect("url"), HOME);
}

// ============================================================================
// Chain Details
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_target_removed_even_when_unresolved() {
    let ctx = home_with(MemoryElement::new(register_link()).target("_blank"));
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::Unresolved);
    assert!(outcome.target_removed);
    assert_eq!(ctx.removed_attributes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_blank_href_falls_through() {
    let ctx = home_with(MemoryElement::new(register_link()).href("   "));
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::Unresolved);
}

#[tokio::test(start_paused = true)]
async fn test_scripted_open_without_url_uses_href() {
    let ctx = home_with(
        MemoryElement::new(register_link())
            .href("/registration/createAccount")
            .on_click(ClickBehavior::ScriptedOpen(String::new())),
    );
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::HrefFallback);
    assert_eq!(outcome.resolved_url.as_deref(), Some(REGISTER));
}

#[tokio::test(start_paused = true)]
async fn test_error_status_is_tolerated() {
    let ctx = MemoryContext::new()
        .with_page(
            MemoryPage::new(HOME).element(MemoryElement::new(register_link()).href("/gone")),
        )
        .with_page(MemoryPage::new("https://www.naukri.com/gone").status(410));
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let outcome = resolver().resolve(&target, &ctx).await.expect("resolve");

    assert_eq!(outcome.method, NavigationMethod::HrefFallback);
    assert_eq!(
        ctx.current_url().await.expect("url"),
        "https://www.naukri.com/gone"
    );
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_is_load_failure() {
    let ctx = home_with(
        MemoryElement::new(register_link()).href("https://down.naukri.com/register"),
    )
    .with_unreachable("https://down.naukri.com/register");
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    let err = resolver().resolve(&target, &ctx).await.unwrap_err();

    assert!(matches!(err, Error::LoadFailure { status: None, .. }));
    assert!(err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn test_missing_target_is_rejected() {
    let ctx = home_with(MemoryElement::new(register_link()));
    open_home(&ctx).await;

    let target = ClickTarget::<<MemoryContext as AutomationContext>::Element>::missing(
        By::id("nope"),
    );
    let err = resolver().resolve(&target, &ctx).await.unwrap_err();

    assert!(matches!(err, Error::ElementNotFound { ref selector, .. } if selector == "id:nope"));
    assert!(ctx.removed_attributes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_locate_waits_for_late_element() {
    let ctx = home_with(
        MemoryElement::new(register_link())
            .href("/registration/createAccount")
            .appears_after(3),
    );
    open_home(&ctx).await;

    let target = ClickTarget::locate(&ctx, register_link(), &locate_options())
        .await
        .expect("locate");
    assert!(target.exists());
    assert!(target.is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_locate_hidden_element() {
    let ctx = home_with(
        MemoryElement::new(companies_link())
            .href("/companies-hiring-in-india")
            .hidden(),
    );
    open_home(&ctx).await;

    let err = ClickTarget::locate(&ctx, companies_link(), &locate_options())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { timeout_ms: 2000, .. }));

    let target = ClickTarget::locate(&ctx, companies_link(), &locate_options().allow_hidden())
        .await
        .expect("hidden target accepted");
    assert!(!target.is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_resolve_is_idempotent() {
    let ctx = home_with(
        MemoryElement::new(companies_link())
            .href("/companies-hiring-in-india")
            .target("_blank")
            .on_click(ClickBehavior::ScriptedOpen(COMPANIES.to_string())),
    );
    let resolver = resolver();

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        open_home(&ctx).await;
        let target = ClickTarget::locate(&ctx, companies_link(), &locate_options())
            .await
            .expect("locate");
        outcomes.push(resolver.resolve(&target, &ctx).await.expect("resolve"));
    }

    assert_eq!(outcomes[0], outcomes[1]);
}

#[test]
fn test_outcome_serializes_kebab_method() {
    let ctx = home_with(MemoryElement::new(register_link()).href("/registration/createAccount"));

    let outcome = tokio_test::block_on(async {
        open_home(&ctx).await;
        let target = ClickTarget::locate(&ctx, register_link(), &locate_options()).await?;
        resolver().resolve(&target, &ctx).await
    })
    .expect("resolve");

    let json = serde_json::to_value(&outcome).expect("serialize");
    assert_eq!(json["method"], "href-fallback");
    assert_eq!(json["resolvedUrl"], REGISTER);
}

// ============================================================================
// Properties
// ============================================================================

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9][a-z0-9-]{0,11}", 1..4).prop_map(|segments| {
        format!("/{}", segments.join("/"))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_href_joins_against_base(path in path_strategy()) {
        let ctx = home_with(MemoryElement::new(register_link()).href(path.clone()));

        let outcome = tokio_test::block_on(async {
            open_home(&ctx).await;
            let target = ClickTarget::locate(&ctx, register_link(), &locate_options()).await?;
            resolver().resolve(&target, &ctx).await
        });
        let outcome = outcome.expect("resolve");

        let expected = format!("https://www.naukri.com{path}");
        prop_assert_eq!(outcome.method, NavigationMethod::HrefFallback);
        prop_assert_eq!(outcome.resolved_url.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn prop_scripted_open_beats_href(href in path_strategy(), opened in path_strategy()) {
        let destination = format!("https://www.naukri.com{opened}");
        let ctx = home_with(
            MemoryElement::new(register_link())
                .href(href)
                .on_click(ClickBehavior::ScriptedOpen(destination.clone())),
        );

        let outcome = tokio_test::block_on(async {
            open_home(&ctx).await;
            let target = ClickTarget::locate(&ctx, register_link(), &locate_options()).await?;
            resolver().resolve(&target, &ctx).await
        });
        let outcome = outcome.expect("resolve");

        prop_assert_eq!(outcome.method, NavigationMethod::ScriptedOpen);
        prop_assert_eq!(outcome.resolved_url.as_deref(), Some(destination.as_str()));
    }
}
