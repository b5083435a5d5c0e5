//! Takeout Engine
//!
//! The core logic of the takeout ordering backend. It owns the order lifecycle, the shopping cart
//! and address book, the catalog with its cache-aside read paths, and the staff records. It is
//! transport-agnostic: nothing in this crate knows about HTTP or a particular payment provider.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public APIs instead. The
//!    exception is the data types stored in the database, which live in [`mod@db_types`] and are
//!    public.
//! 2. The public service APIs ([`mod@api`]): [`api::OrderFlowApi`] for the order state machine,
//!    [`api::CartApi`], [`api::AddressApi`], [`api::CatalogApi`] (with its cache-aside listing
//!    paths), [`api::StaffApi`], [`api::ReportApi`] for the back-office reports and
//!    [`api::ShopApi`] for the open/closed flag. They are generic over the storage traits in
//!    [`mod@traits`], so any backend that implements those traits can drive them.
//!
//! The engine also emits events at the interesting points of the order lifecycle (payment
//! confirmed, order cancelled, customer reminder). A small hook framework in [`mod@events`] lets
//! callers subscribe async handlers to these.
pub mod api;
pub mod cache;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_objects;
pub mod refunds;
pub mod report_objects;
pub mod storefront_objects;
pub mod traits;

mod sqlite;

pub use sqlite::{db, SqliteDatabase};
