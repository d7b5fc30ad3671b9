pub mod affiliatedb;
pub mod db;
pub mod donationdb;
pub mod musiciandb;
