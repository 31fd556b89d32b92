//! Named page paths used for navigation and redirects.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    Home,
    Login,
    Apply,
    Status,
    Profile,
    AdminScan,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Home,
        Route::Login,
        Route::Apply,
        Route::Status,
        Route::Profile,
        Route::AdminScan,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Apply => "/apply",
            Route::Status => "/status",
            Route::Profile => "/profile",
            Route::AdminScan => "/admin/scan",
        }
    }
}
