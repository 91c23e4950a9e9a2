//! Version information

/// SDK crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string reported to diagnostics, e.g. `chairside-sdk/0.3.2`
pub fn user_agent() -> String {
    format!("chairside-sdk/{VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        assert!(user_agent().starts_with("chairside-sdk/"));
        assert!(!VERSION.is_empty());
    }
}
