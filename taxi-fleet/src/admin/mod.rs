//! Staff-only admin site
//!
//! Change-lists for drivers, cars and manufacturers plus add/change forms
//! for drivers. Every handler extracts [`StaffUser`], so non-staff drivers
//! get 403; anonymous requests never get this far because the routes sit
//! behind the authentication middleware.

use crate::auth::{FlashMessage, Session, StaffUser};
use crate::error::{TaxiError, TaxiResult};
use crate::forms::{DriverChangeForm, DriverCreationForm, FormData, ValidationErrors};
use crate::models::{search_term, Car, Driver, Manufacturer};
use crate::responses::Found;
use crate::state::AppState;
use crate::template::{HxTemplate, PageContext};
use crate::urls::Route;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

/// `?q=` search on a change-list
#[derive(Debug, Default, Deserialize)]
pub struct ChangelistQuery {
    /// Search term
    pub q: Option<String>,
}

/// Car change-list filters
#[derive(Debug, Default, Deserialize)]
pub struct CarChangelistQuery {
    /// Model search term
    pub q: Option<String>,
    /// Manufacturer filter
    #[serde(rename = "manufacturer__id__exact")]
    pub manufacturer_id: Option<String>,
}

/// Admin home
#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Driver change-list link
    pub drivers_url: String,
    /// Car change-list link
    pub cars_url: String,
    /// Manufacturer change-list link
    pub manufacturers_url: String,
}

/// One row of the driver change-list
#[derive(Debug, Clone)]
pub struct DriverRow {
    /// Change form link
    pub change_url: String,
    /// The driver
    pub driver: Driver,
}

/// Driver change-list
#[derive(Template)]
#[template(path = "admin/driver_changelist.html")]
pub struct DriverChangelistTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Matching drivers
    pub rows: Vec<DriverRow>,
    /// Current search term
    pub q: String,
    /// Add form link
    pub add_url: String,
}

/// Driver add form
#[derive(Template)]
#[template(path = "admin/driver_add.html")]
pub struct DriverAddTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Bound values, passwords blanked
    pub form: DriverCreationForm,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
}

/// Driver change form
#[derive(Template)]
#[template(path = "admin/driver_change.html")]
pub struct DriverChangeTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Driver being edited
    pub driver: Driver,
    /// Bound or initial values
    pub form: DriverChangeForm,
    /// Errors from the last submit
    pub errors: ValidationErrors,
    /// Form target
    pub action: String,
}

/// Manufacturer filter entry on the car change-list
#[derive(Debug, Clone)]
pub struct FilterLink {
    /// Link text
    pub label: String,
    /// Filtered change-list URL
    pub url: String,
    /// Currently applied
    pub selected: bool,
}

/// Car change-list
#[derive(Template)]
#[template(path = "admin/car_changelist.html")]
pub struct CarChangelistTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Matching cars
    pub cars: Vec<Car>,
    /// Current search term
    pub q: String,
    /// Manufacturer filter links, "All" first
    pub filters: Vec<FilterLink>,
}

/// Manufacturer change-list
#[derive(Template)]
#[template(path = "admin/manufacturer_changelist.html")]
pub struct ManufacturerChangelistTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Matching manufacturers
    pub manufacturers: Vec<Manufacturer>,
    /// Current search term
    pub q: String,
}

/// `GET /admin/`
pub async fn index(
    StaffUser(user): StaffUser,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let template = AdminIndexTemplate {
        ctx: PageContext::new(&user, &mut session),
        drivers_url: Route::AdminDriverChangelist.path(),
        cars_url: Route::AdminCarChangelist.path(),
        manufacturers_url: Route::AdminManufacturerChangelist.path(),
    };
    Ok((session, template.render_html()?))
}

/// `GET /admin/taxi/driver/`
pub async fn driver_changelist(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Query(query): Query<ChangelistQuery>,
) -> TaxiResult<impl IntoResponse> {
    let q = search_term(query.q.as_deref()).unwrap_or_default().to_string();
    let rows = Driver::admin_search(state.pool(), Some(q.as_str()))
        .await?
        .into_iter()
        .map(|driver| DriverRow {
            change_url: Route::AdminDriverChange(driver.id).path(),
            driver,
        })
        .collect();

    let template = DriverChangelistTemplate {
        ctx: PageContext::new(&user, &mut session),
        rows,
        q,
        add_url: Route::AdminDriverAdd.path(),
    };
    Ok((session, template.render_html()?))
}

/// `GET /admin/taxi/driver/add/`
pub async fn driver_add_page(
    StaffUser(user): StaffUser,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let template = DriverAddTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: DriverCreationForm::default(),
        errors: ValidationErrors::new(),
        action: Route::AdminDriverAdd.path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /admin/taxi/driver/add/`
pub async fn driver_add(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let form = DriverCreationForm::from_data(&data);

    match form.clean_with_store(state.pool(), &state.config().license).await? {
        Ok(cleaned) => {
            let driver =
                Driver::create_user(state.pool(), state.hasher(), &cleaned.into_new_driver())
                    .await?;
            tracing::info!(admin = %user.username, driver = %driver.username, "driver added via admin");
            session.add_flash(FlashMessage::success(format!(
                "The driver \"{driver}\" was added successfully. You may edit it again below."
            )));
            Ok((session, Found::to(Route::AdminDriverChange(driver.id).path())).into_response())
        }
        Err(errors) => {
            let template = DriverAddTemplate {
                ctx: PageContext::new(&user, &mut session),
                form: form.without_passwords(),
                errors,
                action: Route::AdminDriverAdd.path(),
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /admin/taxi/driver/{id}/change/`
pub async fn driver_change_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Path(id): Path<i64>,
) -> TaxiResult<impl IntoResponse> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let template = DriverChangeTemplate {
        ctx: PageContext::new(&user, &mut session),
        form: DriverChangeForm::from_driver(&driver),
        driver,
        errors: ValidationErrors::new(),
        action: Route::AdminDriverChange(id).path(),
    };
    Ok((session, template.render_html()?))
}

/// `POST /admin/taxi/driver/{id}/change/`
pub async fn driver_change(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> TaxiResult<Response> {
    let driver = Driver::find_by_id(state.pool(), id).await?;
    let form = DriverChangeForm::from_data(&data);

    match form.clean_with_store(state.pool(), id).await? {
        Ok(profile) => {
            let driver = Driver::update_profile(state.pool(), id, &profile).await?;
            tracing::info!(admin = %user.username, driver = %driver.username, "driver changed via admin");
            session.add_flash(FlashMessage::success(format!(
                "The driver \"{driver}\" was changed successfully."
            )));
            Ok((session, Found::to(Route::AdminDriverChangelist.path())).into_response())
        }
        Err(errors) => {
            let template = DriverChangeTemplate {
                ctx: PageContext::new(&user, &mut session),
                driver,
                form,
                errors,
                action: Route::AdminDriverChange(id).path(),
            };
            Ok((session, template.render_html()?).into_response())
        }
    }
}

/// `GET /admin/taxi/car/`
pub async fn car_changelist(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Query(query): Query<CarChangelistQuery>,
) -> TaxiResult<impl IntoResponse> {
    let q = search_term(query.q.as_deref()).unwrap_or_default().to_string();
    let manufacturer_id = match search_term(query.manufacturer_id.as_deref()) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            TaxiError::BadRequest(format!("Invalid manufacturer filter ({raw})"))
        })?),
        None => None,
    };

    let cars = Car::admin_search(state.pool(), Some(q.as_str()), manufacturer_id).await?;

    let base = Route::AdminCarChangelist.path();
    let mut filters = vec![FilterLink {
        label: "All".into(),
        url: crate::template::helpers::query_url(&base, &[("q", q.as_str())]),
        selected: manufacturer_id.is_none(),
    }];
    for manufacturer in Manufacturer::all(state.pool()).await? {
        let id = manufacturer.id.to_string();
        filters.push(FilterLink {
            url: crate::template::helpers::query_url(
                &base,
                &[("q", q.as_str()), ("manufacturer__id__exact", id.as_str())],
            ),
            selected: manufacturer_id == Some(manufacturer.id),
            label: manufacturer.to_string(),
        });
    }

    let template = CarChangelistTemplate {
        ctx: PageContext::new(&user, &mut session),
        cars,
        q,
        filters,
    };
    Ok((session, template.render_html()?))
}

/// `GET /admin/taxi/manufacturer/`
pub async fn manufacturer_changelist(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    mut session: Session,
    Query(query): Query<ChangelistQuery>,
) -> TaxiResult<impl IntoResponse> {
    let q = search_term(query.q.as_deref()).unwrap_or_default().to_string();
    let total = Manufacturer::count(state.pool(), Some(q.as_str())).await?;
    let manufacturers = Manufacturer::list(state.pool(), Some(q.as_str()), total.max(1), 0).await?;

    let template = ManufacturerChangelistTemplate {
        ctx: PageContext::new(&user, &mut session),
        manufacturers,
        q,
    };
    Ok((session, template.render_html()?))
}
