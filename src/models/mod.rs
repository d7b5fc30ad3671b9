pub mod affiliatemodel;
pub mod donationmodel;
pub mod musicianmodel;
