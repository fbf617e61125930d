//! Schedule dashboard: weekly and special schedules per signed-in user,
//! stored in a hosted Supabase project and served as a web page.

pub mod capability;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod locale;
pub mod models;
pub mod notifier;
pub mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod supabase;
pub mod view;
