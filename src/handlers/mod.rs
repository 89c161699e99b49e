pub mod item;
pub mod sale;
pub mod tax_rate;
