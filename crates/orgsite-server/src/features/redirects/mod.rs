//! Short links served from `/redir/:slug`

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateRedirectError, DeleteRedirectError, RedirectFields, RedirectForm, RedirectFormError,
    UpdateRedirectError,
};
pub use routes::{redir_routes, redirects_admin_routes};
