//! Named routes
//!
//! Every page has a stable name (`manufacturer-list`, `car-create`, ...), an
//! axum path pattern used when building the router, and a concrete path used
//! for links and redirects.

/// A named route, with its path parameter where it has one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Home page with fleet counters
    Index,
    /// Login form
    Login,
    /// Logout action
    Logout,
    /// Manufacturer list with name search
    ManufacturerList,
    /// New manufacturer
    ManufacturerCreate,
    /// Edit a manufacturer
    ManufacturerUpdate(i64),
    /// Delete a manufacturer
    ManufacturerDelete(i64),
    /// Car list with model search
    CarList,
    /// Car detail
    CarDetail(i64),
    /// New car
    CarCreate,
    /// Edit a car
    CarUpdate(i64),
    /// Delete a car
    CarDelete(i64),
    /// Assign or unassign the current driver to a car
    ToggleCarAssign(i64),
    /// Driver list with username search
    DriverList,
    /// Driver detail
    DriverDetail(i64),
    /// Register a driver
    DriverCreate,
    /// Change a driver's license number
    DriverUpdate(i64),
    /// Delete a driver
    DriverDelete(i64),
    /// Admin site index
    AdminIndex,
    /// Admin driver change-list
    AdminDriverChangelist,
    /// Admin add-driver form
    AdminDriverAdd,
    /// Admin driver change form
    AdminDriverChange(i64),
    /// Admin car change-list
    AdminCarChangelist,
    /// Admin manufacturer change-list
    AdminManufacturerChangelist,
}

impl Route {
    /// The route's name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::ManufacturerList => "manufacturer-list",
            Self::ManufacturerCreate => "manufacturer-create",
            Self::ManufacturerUpdate(_) => "manufacturer-update",
            Self::ManufacturerDelete(_) => "manufacturer-delete",
            Self::CarList => "car-list",
            Self::CarDetail(_) => "car-detail",
            Self::CarCreate => "car-create",
            Self::CarUpdate(_) => "car-update",
            Self::CarDelete(_) => "car-delete",
            Self::ToggleCarAssign(_) => "toggle-car-assign",
            Self::DriverList => "driver-list",
            Self::DriverDetail(_) => "driver-detail",
            Self::DriverCreate => "driver-create",
            Self::DriverUpdate(_) => "driver-update",
            Self::DriverDelete(_) => "driver-delete",
            Self::AdminIndex => "admin:index",
            Self::AdminDriverChangelist => "admin:taxi_driver_changelist",
            Self::AdminDriverAdd => "admin:taxi_driver_add",
            Self::AdminDriverChange(_) => "admin:taxi_driver_change",
            Self::AdminCarChangelist => "admin:taxi_car_changelist",
            Self::AdminManufacturerChangelist => "admin:taxi_manufacturer_changelist",
        }
    }

    /// Axum path pattern for the router
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Index => "/",
            Self::Login => "/accounts/login/",
            Self::Logout => "/accounts/logout/",
            Self::ManufacturerList => "/manufacturers/",
            Self::ManufacturerCreate => "/manufacturers/create/",
            Self::ManufacturerUpdate(_) => "/manufacturers/{id}/update/",
            Self::ManufacturerDelete(_) => "/manufacturers/{id}/delete/",
            Self::CarList => "/cars/",
            Self::CarDetail(_) => "/cars/{id}/",
            Self::CarCreate => "/cars/create/",
            Self::CarUpdate(_) => "/cars/{id}/update/",
            Self::CarDelete(_) => "/cars/{id}/delete/",
            Self::ToggleCarAssign(_) => "/cars/{id}/toggle-assign/",
            Self::DriverList => "/drivers/",
            Self::DriverDetail(_) => "/drivers/{id}/",
            Self::DriverCreate => "/drivers/create/",
            Self::DriverUpdate(_) => "/drivers/{id}/update/",
            Self::DriverDelete(_) => "/drivers/{id}/delete/",
            Self::AdminIndex => "/admin/",
            Self::AdminDriverChangelist => "/admin/taxi/driver/",
            Self::AdminDriverAdd => "/admin/taxi/driver/add/",
            Self::AdminDriverChange(_) => "/admin/taxi/driver/{id}/change/",
            Self::AdminCarChangelist => "/admin/taxi/car/",
            Self::AdminManufacturerChangelist => "/admin/taxi/manufacturer/",
        }
    }

    /// The parameter substituted for `{id}`, if any
    #[must_use]
    pub const fn id(self) -> Option<i64> {
        match self {
            Self::ManufacturerUpdate(id)
            | Self::ManufacturerDelete(id)
            | Self::CarDetail(id)
            | Self::CarUpdate(id)
            | Self::CarDelete(id)
            | Self::ToggleCarAssign(id)
            | Self::DriverDetail(id)
            | Self::DriverUpdate(id)
            | Self::DriverDelete(id)
            | Self::AdminDriverChange(id) => Some(id),
            _ => None,
        }
    }

    /// Concrete path for links and redirects
    #[must_use]
    pub fn path(self) -> String {
        let pattern = self.pattern();
        match self.id() {
            Some(id) => pattern.replace("{id}", &id.to_string()),
            None => pattern.to_string(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
