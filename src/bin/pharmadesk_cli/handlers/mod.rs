#![deny(clippy::all, clippy::pedantic)]

pub mod checkout;
pub mod dashboard;
pub mod medicines;
pub mod sales;
pub mod session;
