//! Manufacturer list, create, update and delete pages

use super::ConfirmDeleteTemplate;
use crate::auth::{Authenticated, FlashMessage, Session};
use crate::error::TaxiResult;
use crate::forms::{FormData, ManufacturerForm, ValidationErrors};
use crate::models::{search_term, Manufacturer};
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
pub struct ManufacturerQuery {
    /// Name substring
    pub name: Option<String>,
    /// Page number or `last`
    pub page: Option<String>,
}

/// Manufacturer list page
#[derive(Template)]
#[template(path = "taxi/manufacturer_list.html")]
pub struct ManufacturerListTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Manufacturers on this page
    pub manufacturer_list: Vec<Manufacturer>,
    /// Current search term
    pub search: String,
    /// HTMX attributes for the search box
    pub search_attrs: String,
    /// Page links
    pub pagination: Pagination,
}

/// Manufacturer create/update page
#[derive(Template)]
#[template(path = "taxi/manufacturer_form.html")]
pub struct ManufacturerFormTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Bound or initial values
    pub form: ManufacturerForm,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
    /// Editing an existing record
    pub is_update: bool,
}

/// `GET /manufacturers/`
pub async fn list(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<ManufacturerQuery>,
) -> TaxiResult<impl IntoResponse> {
    let search = search_term(query.name.as_deref()).unwrap_or_default().to_string();
    let page = Manufacturer::page(
        state.pool(),
        Some(search.as_str()),
        query.page.as_deref(),
        state.config().pagination.page_size,
    )
    .await?;

    let path = Route::ManufacturerList.path();
    let template = ManufacturerListTemplate {
        ctx: PageContext::for_request(&user, &mut session, is_htmx),
        pagination: Pagination::new(&page, &path, "name", &search),
        search_attrs: helpers::live_search(&path, "#manufacturer-table"),
        manufacturer_list: page.items,
        search,
    };

    Ok((session, template.render_htmx(is_htmx)?))
}

/// `GET /manufacturers/create/`
pub async fn create_page(
    Authenticated(user): Authenticated,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let template = ManufacturerFormTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: ManufacturerForm::default(),
        errors: ValidationErrors::new(),
        action: Route::ManufacturerCreate.path(),
        is_update: false,
    };
    Ok((session, template.render_html()?))
}

/// `POST /manufacturers/create/`
pub async fn create(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let form = ManufacturerForm::from_data(&data);

    match form.clean_with_store(state.pool(), None).await? {
        Ok(new) => {
            let manufacturer = Manufacturer::create(state.pool(), &new).await?;
            session.add_flash(FlashMessage::success(format!(
                "Manufacturer \"{}\" was added.",
                manufacturer.name
            )));
            Ok((session, Found::to(Route::ManufacturerList.path())).into_response())
        }
        Err(errors) => {
            let template = ManufacturerFormTemplate {
                ctx: PageContext::new(&user, &mut session),
                form,
                errors,
                action: Route::ManufacturerCreate.path(),
                is_update: false,
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /manufacturers/{id}/update/`
pub async fn update_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let manufacturer = Manufacturer::find_by_id(state.pool(), id).await?;
    let template = ManufacturerFormTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: ManufacturerForm::from_manufacturer(&manufacturer),
        errors: ValidationErrors::new(),
        action: Route::ManufacturerUpdate(id).path(),
        is_update: true,
    };
    Ok((session, template.render_html()?))
}

/// `POST /manufacturers/{id}/update/`
pub async fn update(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    Manufacturer::find_by_id(state.pool(), id).await?;
    let form = ManufacturerForm::from_data(&data);

    match form.clean_with_store(state.pool(), Some(id)).await? {
        Ok(changes) => {
            let manufacturer = Manufacturer::update(state.pool(), id, &changes).await?;
            session.add_flash(FlashMessage::success(format!(
                "Manufacturer \"{}\" was changed.",
                manufacturer.name
            )));
            Ok((session, Found::to(Route::ManufacturerList.path())).into_response())
        }
        Err(errors) => {
            let template = ManufacturerFormTemplate {
                ctx: PageContext::new(&user, &mut session),
                form,
                errors,
                action: Route::ManufacturerUpdate(id).path(),
                is_update: true,
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /manufacturers/{id}/delete/`
pub async fn delete_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let manufacturer = Manufacturer::find_by_id(state.pool(), id).await?;
    let template = ConfirmDeleteTemplate {
        ctx: PageContext::new(&user, &mut session),
        kind: "manufacturer",
        object: manufacturer.to_string(),
        action: Route::ManufacturerDelete(id).path(),
        cancel_url: Route::ManufacturerList.path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /manufacturers/{id}/delete/`
pub async fn delete(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let manufacturer = Manufacturer::find_by_id(state.pool(), id).await?;
    Manufacturer::delete(state.pool(), id).await?;

    session.add_flash(FlashMessage::success(format!(
        "Manufacturer \"{}\" was deleted.",
        manufacturer.name
    )));
    Ok((session, Found::to(Route::ManufacturerList.path())))
}
