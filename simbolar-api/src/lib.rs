#![cfg_attr(not(feature = "std"), no_std)]

pub mod bits;
pub mod level;
pub mod models;
