pub mod dashboard;
pub mod donations;
pub mod referrals;
