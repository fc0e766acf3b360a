//! Registration, verification and route inspection.

use artisan_core::Role;
use artisan_storefront::account::{self, Registration};
use artisan_storefront::Decision;

use super::{CliError, emit, sign_in, start_app};
use crate::LoginArgs;

/// Create an account and its user document.
pub async fn register(name: &str, email: &str, password: &str, seller: bool) -> Result<(), CliError> {
    let role = if seller { Role::Seller } else { Role::User };
    let app = start_app().await?;

    let registration = Registration::new(name, email, password).with_role(role);
    let result = account::register(app.session(), app.backend().store.as_ref(), &registration).await;
    app.shutdown();

    let identity = result?;
    emit(format!("Registered {} as {role} ({})", email.trim(), identity.uid));
    emit("Check your inbox to verify your email, then log in.");
    Ok(())
}

/// Resend the verification email.
pub async fn verify(login: &LoginArgs) -> Result<(), CliError> {
    let app = start_app().await?;
    if !sign_in(&app, login).await? {
        app.shutdown();
        return Err(CliError::InvalidArgument(
            "--email and --password are required".to_string(),
        ));
    }
    let result = account::resend_verification(app.session()).await;
    app.shutdown();

    emit(result?);
    Ok(())
}

/// Describe what `path` shows, signing in first when credentials are given.
pub async fn open(path: &str, login: &LoginArgs) -> Result<(), CliError> {
    let app = start_app().await?;
    let signed_in = sign_in(&app, login).await?;
    let view = app.open_resolved(path).await;
    let session = app.session().current_session();
    app.shutdown();

    let who = match (session.email(), session.role) {
        (Some(email), Some(role)) => format!("{email} ({role})"),
        (Some(email), None) => format!("{email} (no role)"),
        _ => "anonymous".to_string(),
    };
    if signed_in {
        emit(format!("Signed in as {who}"));
    }

    match view.decision {
        Decision::Render => emit(format!("{path} renders {}", view.route.title())),
        decision => emit(format!(
            "{path} redirects to {} for {who}",
            decision.redirect_target().unwrap_or("/")
        )),
    }
    emit(format!("Now at {}", app.navigator().current_path()));
    Ok(())
}
