pub mod archive;
pub mod audit;
pub mod config;
pub mod date_key;
pub mod engine;
pub mod kv;
pub mod ledger;
pub mod lock;
pub mod milestone;
pub mod paths;
pub mod practice;
pub mod progress;
pub mod reconcile;
pub mod sobriety;
pub mod state;
pub mod util;
pub mod warn;
