pub mod admin;
pub mod auth;
pub mod episodes;
pub mod error;
pub mod notifications;
pub mod series;
pub mod upload;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    admin::configure(conf);
    auth::configure(conf);
    episodes::configure(conf);
    notifications::configure(conf);
    series::configure(conf);
    upload::configure(conf);
}
