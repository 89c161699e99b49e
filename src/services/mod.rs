pub mod calculator;
pub mod catalog;
pub mod checkout;
pub mod sales;
