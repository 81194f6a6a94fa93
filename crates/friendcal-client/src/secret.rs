//! Secret references in configuration values.
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the
//!   first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is the value itself

use std::process::Command;

const PASS_PREFIX: &str = "pass::";
const ENV_PREFIX: &str = "env::";

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix(PASS_PREFIX) {
        from_pass(path)
    } else if let Some(var) = value.strip_prefix(ENV_PREFIX) {
        std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
    } else {
        Ok(value.to_string())
    }
}

/// Whether `value` points outside the config file.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(PASS_PREFIX) || value.starts_with(ENV_PREFIX)
}

fn from_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(resolve("me@example.com").unwrap(), "me@example.com");
        assert_eq!(resolve("").unwrap(), "");
        assert!(!is_reference("me@example.com"));
    }

    #[test]
    fn env_reference() {
        unsafe {
            std::env::set_var("_FRIENDCAL_TEST_PASSWORD", "s3cret");
        }
        assert!(is_reference("env::_FRIENDCAL_TEST_PASSWORD"));
        assert_eq!(resolve("env::_FRIENDCAL_TEST_PASSWORD").unwrap(), "s3cret");
        unsafe {
            std::env::remove_var("_FRIENDCAL_TEST_PASSWORD");
        }
    }

    #[test]
    fn missing_env_var_errors() {
        let err = resolve("env::_FRIENDCAL_UNSET_VAR_98765").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn unknown_pass_entry_errors() {
        assert!(resolve("pass::friendcal/does/not/exist/98765").is_err());
    }
}
