use rand::{distr::Alphanumeric, Rng};

/// Opaque reference attached to every settlement attempt before the gateway
/// is consulted, so declined attempts stay traceable.
pub fn generate_settlement_reference() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();
    format!("DON-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_has_prefix_and_length() {
        let reference = generate_settlement_reference();
        assert!(reference.starts_with("DON-"));
        assert_eq!(reference.len(), 16);
    }
}
