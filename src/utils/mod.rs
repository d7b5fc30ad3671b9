pub mod currency;
pub mod reference;
