//! Home page

use crate::auth::{Authenticated, Session};
use crate::error::TaxiResult;
use crate::models::{Car, Driver, Manufacturer};
use crate::state::AppState;
use crate::template::{HxTemplate, PageContext};
use askama::Template;
use axum::{extract::State, response::IntoResponse};

const VISITS_KEY: &str = "num_visits";

/// Home page with fleet counters
#[derive(Template)]
#[template(path = "taxi/index.html")]
pub struct IndexTemplate {
    /// Layout values
    pub ctx: PageContext,
    /// Registered drivers
    pub num_drivers: i64,
    /// Cars in the fleet
    pub num_cars: i64,
    /// Known manufacturers
    pub num_manufacturers: i64,
    /// Home page views in this session, including this one
    pub num_visits: u64,
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    mut session: Session,
) -> TaxiResult<impl IntoResponse> {
    let pool = state.pool();
    let num_visits = session.get::<u64>(VISITS_KEY).unwrap_or(0) + 1;
    session.set(VISITS_KEY, num_visits)?;

    let template = IndexTemplate {
        ctx: PageContext::new(&user, &mut session),
        num_drivers: Driver::count(pool, None).await?,
        num_cars: Car::count(pool, None).await?,
        num_manufacturers: Manufacturer::count(pool, None).await?,
        num_visits,
    };

    Ok((session, template.render_html()?))
}
