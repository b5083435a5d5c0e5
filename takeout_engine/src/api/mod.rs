//! The public service APIs, generic over the storage traits so tests and alternative backends can
//! swap the database out.
mod address_api;
mod cart_api;
mod catalog_api;
mod order_flow_api;
mod report_api;
mod shop_api;
mod staff_api;

pub use address_api::AddressApi;
pub use cart_api::CartApi;
pub use catalog_api::CatalogApi;
pub use order_flow_api::{OrderFlowApi, TIMEOUT_CANCEL_REASON, USER_CANCEL_REASON};
pub use report_api::{ReportApi, MAX_REPORT_DAYS, TOP_SALES_LIMIT};
pub use shop_api::ShopApi;
pub use staff_api::StaffApi;
