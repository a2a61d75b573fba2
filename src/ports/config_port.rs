//! Configuration access port.
//!
//! Lookups are by INI section and key. Numeric getters fall back to
//! `default` when the key is absent or does not parse.

pub trait ConfigPort {
    /// Raw value, untrimmed, or `None` when the key is absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
