//! Shared building blocks for the user registry crates:
//! logging setup, prometheus metrics, health payloads and the admin listener.

pub mod types;
pub mod utils;
pub mod metrics;
pub mod admin_http;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::ok();
        assert_eq!(h.status, "ok");
    }
}
