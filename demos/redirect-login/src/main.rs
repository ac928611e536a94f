//! Redirect login demo binary
//!
//! Walks one user through the whole session lifecycle against the mock
//! identity provider: landing page, guarded dashboard, login redirect,
//! callback, profile and logout.
//!
//! Configuration comes from `AUTHFLOW_*` environment variables; without
//! them a local demo configuration is used.

use anyhow::{bail, Context};
use authflow::mocks::{MockIdentityProvider, RecordingNavigator};
use authflow::{
    AuthContext, CallbackOutcome, GuardView, Identity, LandingView, MemoryPendingLoginStore,
    SessionConfig, SessionEnvironment,
};
use authflow_core::environment::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_RETURN_URI: &str = "http://localhost:3000/redirect";
const DEMO_REFERRAL_CODE: &str = "DEMO";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redirect_login_demo=info,authflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Redirect Login Demo ===\n");

    let config = load_config();
    let return_uri = config.return_uri().to_string();

    let provider = MockIdentityProvider::new().with_identity(
        Identity::new("demo.learner").with_linked_address("0x5eC0000000000000000000000000000000000001"),
    );
    let navigator = RecordingNavigator::new();
    let environment =
        SessionEnvironment::new(provider.clone(), MemoryPendingLoginStore::new(), SystemClock);
    let context = AuthContext::new(config, environment);

    // Application mount
    context.mount().await.wait().await;
    render_landing(&context.snapshot());

    // Visiting the dashboard without a session
    println!("\n>>> Visiting /dashboard");
    let guard = context.route_guard(navigator.clone());
    println!("Guard: {:?} (navigated to {:?})", guard.render(), navigator.last());

    // Login button
    println!("\n>>> Clicking login");
    let login = context.login_initiator();
    let state = login
        .login_with_generated_state()
        .await
        .context("login redirect failed")?;
    println!("Redirected to the identity provider with state {state}");

    // Provider sends the browser back
    let callback_url = provider.callback_url(&return_uri, &state);
    println!("\n>>> Provider redirects to {callback_url}");
    let handler = context.callback_handler(navigator.clone());
    match handler.run_from_url(&callback_url).await {
        CallbackOutcome::Resolved(identity) => {
            println!("Signed in as {}", identity.subject_id);
        },
        CallbackOutcome::Failed(error) => bail!("callback failed: {error}"),
    }
    println!("Navigated to {:?}", navigator.last());

    // Dashboard
    println!("\n>>> Rendering /dashboard");
    println!("Guard: {:?}", guard.render());
    render_landing(&context.snapshot());

    // Logout button
    println!("\n>>> Clicking logout");
    context
        .session_terminator()
        .logout_default()
        .await
        .context("logout failed")?;
    render_landing(&context.snapshot());

    let view = guard.render();
    println!("Guard after logout: {view:?} (navigated to {:?})", navigator.last());
    if view != GuardView::Fallback {
        bail!("guard still renders protected content after logout");
    }

    println!("\nNavigation history: {:?}", navigator.visits());
    println!("\n=== Demo Complete ===");
    Ok(())
}

fn load_config() -> SessionConfig {
    let config = SessionConfig::from_env();
    match config.validate() {
        Ok(()) => config,
        Err(error) => {
            tracing::warn!(%error, "Environment configuration unusable, using the demo configuration");
            SessionConfig::new(DEMO_RETURN_URI, DEMO_REFERRAL_CODE)
        },
    }
}

fn render_landing(auth: &authflow::AuthState) {
    match LandingView::from_state(auth) {
        LandingView::Loading => println!("[landing] Initializing..."),
        LandingView::SignedOut => println!("[landing] Not signed in. [Login]"),
        LandingView::Profile(card) => {
            println!("[landing] Profile");
            print!("{card}");
            println!("[Logout]");
        },
        LandingView::Error(message) => println!("[landing] Error: {message}"),
    }
}
