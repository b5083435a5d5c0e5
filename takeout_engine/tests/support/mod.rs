#![allow(dead_code)]
pub mod prepare_env;

use std::sync::Arc;

use takeout_engine::{
    api::OrderFlowApi,
    events::EventProducers,
    refunds::LogOnlyRefunds,
    SqliteDatabase,
};

pub fn order_api(db: SqliteDatabase) -> OrderFlowApi<SqliteDatabase> {
    OrderFlowApi::new(db, EventProducers::default(), Arc::new(LogOnlyRefunds))
}

pub fn order_api_with_producers(db: SqliteDatabase, producers: EventProducers) -> OrderFlowApi<SqliteDatabase> {
    OrderFlowApi::new(db, producers, Arc::new(LogOnlyRefunds))
}
