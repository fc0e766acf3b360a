//! Artisan Market storefront.
//!
//! The client application as a library: everything a front-end needs to
//! browse the catalog, keep a cart, sign in, and run the seller console.
//! Rendering is left to the front-end (the `artisan` CLI in this workspace);
//! this crate decides what to show and where to go.
//!
//! # Modules
//!
//! - [`session`] - Signed-in identity and role, login and logout
//! - [`gate`] - Render-or-redirect decisions for gated routes
//! - [`routes`] - The route table
//! - [`navigation`] - Navigation signals
//! - [`app`] - Ties the above together on top of a [`artisan_backend::Backend`]
//! - [`catalog`], [`product`], [`cart`] - Shopping
//! - [`seller`] - Add item, inventory and dashboard
//! - [`profile`], [`account`] - Profile forms and registration
//! - [`api`] - Client for the seller API service

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod api;
pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod navigation;
pub mod product;
pub mod profile;
pub mod routes;
pub mod seller;
pub mod session;

pub use app::{App, View};
pub use error::{AppError, Result};
pub use gate::{Decision, authorize};
pub use routes::{Route, RouteRequirement};
pub use session::{Session, SessionStatus, SessionStore};
