//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A value that the named environment variable overrides when set and
    /// non-empty. Used for credentials.
    fn get_string_or_env(&self, section: &str, key: &str, env_var: &str) -> Option<String> {
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.get_string(section, key))
    }
}
