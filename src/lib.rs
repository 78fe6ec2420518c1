pub use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use tera::Tera;

pub mod agent;
pub mod cli;
pub mod config;
pub mod opt;
pub mod paths;
pub mod sim;
pub mod space;

lazy_static! {
    pub static ref TEMPLATES: Tera =
        match Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/*")) {
            Ok(t) => t,
            Err(e) => panic!("Error parsing templates: {e}"),
        };
}
