//! Login and logout

use crate::auth::{FlashMessage, Session};
use crate::error::TaxiResult;
use crate::forms::{FormData, LoginForm, ValidationErrors};
use crate::responses::{safe_next, Found};
use crate::state::AppState;
use crate::template::{HxTemplate, PageContext};
use crate::urls::Route;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

/// `?next=` on the login page
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Page to return to after login
    pub next: Option<String>,
}

/// Login page
#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Submitted username
    pub username: String,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Post-login target carried through the form
    pub next: String,
    /// Form target
    pub action: String,
}

/// `GET /accounts/login/`
pub async fn login_page(
    mut session: Session,
    Query(query): Query<LoginQuery>,
) -> TaxiResult<impl IntoResponse> {
    let template = LoginTemplate {
        ctx: PageContext::anonymous(&mut session),
        username: String::new(),
        errors: ValidationErrors::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
        action: Route::Login.path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /accounts/login/`
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let form = LoginForm::from_data(&data);
    let next = safe_next(data.raw("next")).map(ToString::to_string);

    match form.authenticate(state.pool(), state.hasher()).await? {
        Ok(driver) => {
            session.login(driver.id);
            tracing::info!(username = %driver.username, "driver logged in");

            let target = next.unwrap_or_else(|| Route::Index.path());
            Ok((session, Found::to(target)).into_response())
        }
        Err(errors) => {
            let template = LoginTemplate {
                ctx: PageContext::anonymous(&mut session),
                username: form.username,
                errors,
                next: next.unwrap_or_default(),
                action: Route::Login.path(),
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `POST /accounts/logout/`
pub async fn logout(mut session: Session) -> impl IntoResponse {
    if let Some(user_id) = session.user_id {
        tracing::info!(user_id, "driver logged out");
    }
    session.logout();
    session.add_flash(FlashMessage::info("You have been logged out."));
    (session, Found::to(Route::Login.path()))
}
