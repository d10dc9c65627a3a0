//! Editor for the access rules that protect purchased file downloads.
//!
//! A shop administrator can replace the generated `.htaccess` rules with
//! their own text, save it, and reset back to the generated default. The
//! stored override is substituted into rule generation through a
//! [`rules::RuleFilter`] registered once when the application is wired.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod editor;
pub mod models;
pub mod rules;
