//! Interface contracts of the takeout engine database backends.
//!
//! The engine never talks to a concrete database directly; the API layer is generic over these
//! traits and the SQLite backend in [`crate::sqlite`] implements them.
//!
//! * [`OrderGatewayDatabase`] covers the order lifecycle: atomic submission, guarded status
//!   transitions, search/statistics queries, and the timeout sweep's candidate query.
//! * [`CartManagement`], [`AddressManagement`], [`CatalogManagement`] and [`StaffManagement`]
//!   cover the storefront CRUD surfaces.
//! * [`SalesReporting`] covers the aggregate queries behind the back-office reports.
mod order_gateway;
mod reports;
mod storefront;

pub use order_gateway::{OrderFlowError, OrderGatewayDatabase};
pub use reports::{ReportError, SalesReporting};
pub use storefront::{
    AddressManagement,
    CartManagement,
    CatalogManagement,
    StaffManagement,
    StorefrontError,
};
