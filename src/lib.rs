pub mod args;
pub mod discovery;
pub mod error;
pub mod k8s_client;
pub mod output;
