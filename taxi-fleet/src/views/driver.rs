//! Driver list, detail, registration, license update and delete pages

use super::ConfirmDeleteTemplate;
use crate::auth::{Authenticated, FlashMessage, Session};
use crate::error::TaxiResult;
use crate::forms::{DriverCreationForm, DriverLicenseUpdateForm, FormData, ValidationErrors};
use crate::models::{search_term, Car, Driver};
use crate::responses::Found;
use crate::state::AppState;
use crate::template::{helpers, HxTemplate, PageContext, Pagination};
use crate::urls::Route;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_htmx::HxRequest;
use serde::Deserialize;

/// Query parameters of the list page
#[derive(Debug, Default, Deserialize)]
pub struct DriverQuery {
    /// Username substring
    pub username: Option<String>,
    /// Page number or `last`
    pub page: Option<String>,
}

/// Driver list page
#[derive(Template)]
#[template(path = "taxi/driver_list.html")]
pub struct DriverListTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Drivers on this page
    pub driver_list: Vec<Driver>,
    /// Current search term
    pub search: String,
    /// HTMX attributes for the search box
    pub search_attrs: String,
    /// Page links
    pub pagination: Pagination,
}

/// Driver detail page
#[derive(Template)]
#[template(path = "taxi/driver_detail.html")]
pub struct DriverDetailTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// The driver
    pub driver: Driver,
    /// Cars the driver is assigned to
    pub cars: Vec<Car>,
}

/// Driver registration page
#[derive(Template)]
#[template(path = "taxi/driver_form.html")]
pub struct DriverFormTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Bound values, passwords blanked
    pub form: DriverCreationForm,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
}

/// License number update page
#[derive(Template)]
#[template(path = "taxi/driver_license_form.html")]
pub struct DriverLicenseFormTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Driver being edited
    pub driver: Driver,
    /// Bound or initial value
    pub form: DriverLicenseUpdateForm,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
}

/// `GET /drivers/`
pub async fn list(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<DriverQuery>,
) -> TaxiResult<impl IntoResponse> {
    let search = search_term(query.username.as_deref()).unwrap_or_default().to_string();
    let page = Driver::page(
        state.pool(),
        Some(search.as_str()),
        query.page.as_deref(),
        state.config().pagination.page_size,
    )
    .await?;

    let path = Route::DriverList.path();
    let template = DriverListTemplate {
        ctx: PageContext::for_request(&user, &mut session, is_htmx),
        pagination: Pagination::new(&page, &path, "username", &search),
        search_attrs: helpers::live_search(&path, "#driver-table"),
        driver_list: page.items,
        search,
    };

    Ok((session, template.render_htmx(is_htmx)?))
}

/// `GET /drivers/{id}/`
pub async fn detail(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let cars = driver.cars(state.pool()).await?;

    let template = DriverDetailTemplate {
        ctx: PageContext::new(&user, &mut session),
        driver,
        cars,
    };
    Ok((session, template.render_html()?))
}

/// `GET /drivers/create/`
pub async fn create_page(
    Authenticated(user): Authenticated,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let template = DriverFormTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: DriverCreationForm::default(),
        errors: ValidationErrors::new(),
        action: Route::DriverCreate.path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /drivers/create/`
pub async fn create(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let form = DriverCreationForm::from_data(&data);

    match form.clean_with_store(state.pool(), &state.config().license).await? {
        Ok(cleaned) => {
            let driver =
                Driver::create_user(state.pool(), state.hasher(), &cleaned.into_new_driver())
                    .await?;
            session.add_flash(FlashMessage::success(format!(
                "Driver \"{}\" was registered.",
                driver.username
            )));
            Ok((session, Found::to(Route::DriverDetail(driver.id).path())).into_response())
        }
        Err(errors) => {
            let template = DriverFormTemplate {
                ctx: PageContext::new(&user, &mut session),
                form: form.without_passwords(),
                errors,
                action: Route::DriverCreate.path(),
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /drivers/{id}/update/`
pub async fn update_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let template = DriverLicenseFormTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: DriverLicenseUpdateForm::from_driver(&driver),
        driver,
        errors: ValidationErrors::new(),
        action: Route::DriverUpdate(id).path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /drivers/{id}/update/`
pub async fn update(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let form = DriverLicenseUpdateForm::from_data(&data);

    match form
        .clean_with_store(state.pool(), &state.config().license, id)
        .await?
    {
        Ok(license_number) => {
            Driver::update_license_number(state.pool(), id, &license_number).await?;
            session.add_flash(FlashMessage::success("License number was updated."));
            Ok((session, Found::to(Route::DriverDetail(id).path())).into_response())
        }
        Err(errors) => {
            let template = DriverLicenseFormTemplate {
                ctx: PageContext::new(&user, &mut session),
                driver,
                form,
                errors,
                action: Route::DriverUpdate(id).path(),
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /drivers/{id}/delete/`
pub async fn delete_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let template = ConfirmDeleteTemplate {
        ctx: PageContext::new(&user, &mut session),
        kind: "driver",
        object: driver.to_string(),
        action: Route::DriverDelete(id).path(),
        cancel_url: Route::DriverDetail(id).path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /drivers/{id}/delete/`
pub async fn delete(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    Driver::delete(state.pool(), id).await?;

    session.add_flash(FlashMessage::success(format!(
        "Driver \"{}\" was deleted.",
        driver.username
    )));
    Ok((session, Found::to(Route::DriverList.path())))
}
