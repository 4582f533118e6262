use std::path::PathBuf;

/// Replaces everything but ASCII letters and digits with '_'.
pub fn sanitize_file_name(name: &str) -> String {
    return name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
}

/// Per-user directory for persisted render state.
pub fn get_config_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        if let Some(home) = dirs::home_dir() {
            return home.join(".config").join("luxcorerender.org");
        }
    } else if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            return home.join("luxcorerender.org");
        }
    }
    return std::env::temp_dir().join("luxcorerender.org");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_001() {
        assert_eq!(sanitize_file_name("scene 01/cornell.cfg"), "scene_01_cornell_cfg");
        assert_eq!(sanitize_file_name("Abc123"), "Abc123");
        assert_eq!(sanitize_file_name("é"), "_");
    }

    #[test]
    fn test_002() {
        let dir = get_config_dir();
        assert!(dir.ends_with("luxcorerender.org"));
    }
}
