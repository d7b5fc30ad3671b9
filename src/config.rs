// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    // Payment gateway collaborator
    pub gateway_base_url: String,
    pub gateway_secret_key: String,
    pub gateway_timeout_secs: u64,
    // Fee policy, in basis points of the donation amount
    pub platform_fee_bps: i64,
    pub tier1_fee_bps: i64,
    pub tier2_fee_bps: i64,
    /// When an affiliate tier is absent its share stays with the artist by
    /// default; set ABSENT_TIER_TO_PLATFORM=true to keep it as platform fee.
    pub absent_tier_to_platform: bool,
    // StatsAggregator bootstrap
    pub bootstrap_timeout_secs: u64,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let gateway_base_url = std::env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://api.payments.test".to_string());
        let gateway_secret_key = std::env::var("GATEWAY_SECRET_KEY")
            .unwrap_or_else(|_| "test_secret_key".to_string());
        let gateway_timeout_secs = std::env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);

        let platform_fee_bps = std::env::var("PLATFORM_FEE_BPS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1000); // 10%
        let tier1_fee_bps = std::env::var("TIER1_FEE_BPS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(500); // 5%
        let tier2_fee_bps = std::env::var("TIER2_FEE_BPS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(100); // 1%
        let absent_tier_to_platform = std::env::var("ABSENT_TIER_TO_PLATFORM")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let bootstrap_timeout_secs = std::env::var("BOOTSTRAP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        Config {
            database_url,
            port: 8000,
            gateway_base_url,
            gateway_secret_key,
            gateway_timeout_secs,
            platform_fee_bps,
            tier1_fee_bps,
            tier2_fee_bps,
            absent_tier_to_platform,
            bootstrap_timeout_secs,
        }
    }
}
