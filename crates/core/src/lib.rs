//! Artisan Market Core - Shared types library.
//!
//! This crate provides common types used across all Artisan Market components:
//! - `backend` - Clients for the managed auth, document and object storage services
//! - `storefront` - Client application (session, navigation, catalog, seller console)
//! - `seller-api` - Local HTTP service for seller items and profiles
//! - `cli` - Terminal front-end and migrations
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, roles and categories
//! - [`models`] - Records exchanged with the document store and the seller API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use types::*;
