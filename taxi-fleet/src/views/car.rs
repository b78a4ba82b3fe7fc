//! Car list, detail, create, update, delete and assignment pages

use super::ConfirmDeleteTemplate;
use crate::auth::{Authenticated, FlashMessage, Session};
use crate::error::TaxiResult;
use crate::forms::{CarForm, FormData, ValidationErrors};
use crate::models::{search_term, Car, Driver, Manufacturer};
use crate::responses::Found;
use crate::state::AppState;
use crate::template::{helpers, Choice, HxTemplate, PageContext, Pagination};
use crate::urls::Route;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_htmx::HxRequest;
use serde::Deserialize;
use sqlx::SqlitePool;

/// Query parameters of the list page
#[derive(Debug, Default, Deserialize)]
pub struct CarQuery {
    /// Model substring
    pub model: Option<String>,
    /// Page number or `last`
    pub page: Option<String>,
}

/// Car list page
#[derive(Template)]
#[template(path = "taxi/car_list.html")]
pub struct CarListTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Cars on this page
    pub car_list: Vec<Car>,
    /// Current search term
    pub search: String,
    /// HTMX attributes for the search box
    pub search_attrs: String,
    /// Page links
    pub pagination: Pagination,
}

/// Car detail page
#[derive(Template)]
#[template(path = "taxi/car_detail.html")]
pub struct CarDetailTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// The car
    pub car: Car,
    /// Assigned drivers
    pub drivers: Vec<Driver>,
    /// Whether the current driver is assigned
    pub is_assigned: bool,
}

/// Car create/update page
#[derive(Template)]
#[template(path = "taxi/car_form.html")]
pub struct CarFormTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Bound or initial model name
    pub model: String,
    /// Manufacturer options
    pub manufacturers: Vec<Choice>,
    /// Driver options
    pub drivers: Vec<Choice>,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
    /// Editing an existing record
    pub is_update: bool,
}

impl CarFormTemplate {
    async fn build(
        pool: &SqlitePool,
        ctx: PageContext,
        form: &CarForm,
        errors: ValidationErrors,
        action: Route,
    ) -> TaxiResult<Self> {
        let manufacturers = Manufacturer::all(pool)
            .await?
            .into_iter()
            .map(|m| Choice::new(m.id, &m, form.manufacturer_selected(&m.id)))
            .collect();
        let drivers = Driver::all(pool)
            .await?
            .into_iter()
            .map(|d| Choice::new(d.id, &d, form.driver_selected(&d.id)))
            .collect();

        Ok(Self {
            ctx,
            model: form.model.clone(),
            manufacturers,
            drivers,
            errors,
            action: action.path(),
            is_update: matches!(action, Route::CarUpdate(_)),
        })
    }
}

/// `GET /cars/`
pub async fn list(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<CarQuery>,
) -> TaxiResult<impl IntoResponse> {
    let search = search_term(query.model.as_deref()).unwrap_or_default().to_string();
    let page = Car::page(
        state.pool(),
        Some(search.as_str()),
        query.page.as_deref(),
        state.config().pagination.page_size,
    )
    .await?;

    let path = Route::CarList.path();
    let template = CarListTemplate {
        ctx: PageContext::for_request(&user, &mut session, is_htmx),
        pagination: Pagination::new(&page, &path, "model", &search),
        search_attrs: helpers::live_search(&path, "#car-table"),
        car_list: page.items,
        search,
    };

    Ok((session, template.render_htmx(is_htmx)?))
}

/// `GET /cars/{id}/`
pub async fn detail(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let car = Car::find_by_id(state.pool(), id).await?;
    let drivers = car.drivers(state.pool()).await?;
    let is_assigned = drivers.iter().any(|d| d.id == user.id);

    let template = CarDetailTemplate {
        ctx: PageContext::new(&user, &mut session),
        car,
        drivers,
        is_assigned,
    };
    Ok((session, template.render_html()?))
}

/// `GET /cars/create/`
pub async fn create_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let ctx = PageContext::new(&user, &mut session);
    let template = CarFormTemplate::build(
        state.pool(),
        ctx,
        &CarForm::default(),
        ValidationErrors::new(),
        Route::CarCreate,
    )
    .await?;
    Ok((session, template.render_html()?))
}

/// `POST /cars/create/`
pub async fn create(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let form = CarForm::from_data(&data);

    match form.clean(state.pool()).await? {
        Ok(new) => {
            let car = Car::create(state.pool(), &new).await?;
            session.add_flash(FlashMessage::success(format!("Car \"{car}\" was added.")));
            Ok((session, Found::to(Route::CarList.path())).into_response())
        }
        Err(errors) => {
            let ctx = PageContext::new(&user, &mut session);
            let template =
                CarFormTemplate::build(state.pool(), ctx, &form, errors, Route::CarCreate).await?;
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /cars/{id}/update/`
pub async fn update_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let car = Car::find_by_id(state.pool(), id).await?;
    let driver_ids = Car::driver_ids(state.pool(), id).await?;
    let form = CarForm::from_car(&car, &driver_ids);

    let ctx = PageContext::new(&user, &mut session);
    let template = CarFormTemplate::build(
        state.pool(),
        ctx,
        &form,
        ValidationErrors::new(),
        Route::CarUpdate(id),
    )
    .await?;
    Ok((session, template.render_html()?))
}

/// `POST /cars/{id}/update/`
pub async fn update(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    Car::find_by_id(state.pool(), id).await?;
    let form = CarForm::from_data(&data);

    match form.clean(state.pool()).await? {
        Ok(changes) => {
            let car = Car::update(state.pool(), id, &changes).await?;
            session.add_flash(FlashMessage::success(format!("Car \"{car}\" was changed.")));
            Ok((session, Found::to(Route::CarDetail(id).path())).into_response())
        }
        Err(errors) => {
            let ctx = PageContext::new(&user, &mut session);
            let template =
                CarFormTemplate::build(state.pool(), ctx, &form, errors, Route::CarUpdate(id))
                    .await?;
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /cars/{id}/delete/`
pub async fn delete_page(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let car = Car::find_by_id(state.pool(), id).await?;
    let template = ConfirmDeleteTemplate {
        ctx: PageContext::new(&user, &mut session),
        kind: "car",
        object: car.to_string(),
        action: Route::CarDelete(id).path(),
        cancel_url: Route::CarDetail(id).path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /cars/{id}/delete/`
pub async fn delete(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let car = Car::find_by_id(state.pool(), id).await?;
    Car::delete(state.pool(), id).await?;

    session.add_flash(FlashMessage::success(format!("Car \"{car}\" was deleted.")));
    Ok((session, Found::to(Route::CarList.path())))
}

/// `POST /cars/{id}/toggle-assign/`
///
/// Adds the current driver to the car, or removes them if already assigned.
pub async fn toggle_assign(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let car = Car::find_by_id(state.pool(), id).await?;
    let assigned = Car::toggle_driver(state.pool(), id, user.id).await?;

    let message = if assigned {
        format!("You were assigned to \"{car}\".")
    } else {
        format!("You were removed from \"{car}\".")
    };
    session.add_flash(FlashMessage::info(message));
    Ok((session, Found::to(Route::CarDetail(id).path())))
}
