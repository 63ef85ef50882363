#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

pub mod error;
pub mod reporting;
pub mod sample;
pub mod sampling;
pub mod sensor;
pub mod serial;
pub mod toggle;

pub mod config {
    include!(concat!(env!("OUT_DIR"), "/consts.rs"));
}

pub type Lux = f64;
