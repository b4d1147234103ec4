//! File system helpers used by configuration validation

use std::path::Path;

use super::error::{ProxyError, Result};

/// Check that a path exists and is a regular file
pub fn check_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ProxyError::Config(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(ProxyError::Config(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Check that a path exists and is a directory
pub fn check_dir_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(ProxyError::Config(format!(
            "Directory does not exist: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_check_file_exists() {
        let path = PathBuf::from("Cargo.toml");
        assert!(check_file_exists(&path).is_ok(), "Cargo.toml should exist");

        let path = PathBuf::from("non_existent_file.txt");
        assert!(check_file_exists(&path).is_err());

        // A directory is not a file
        assert!(check_file_exists(Path::new("src")).is_err());
    }

    #[test]
    fn test_check_dir_exists() {
        assert!(check_dir_exists(Path::new("src")).is_ok());
        assert!(check_dir_exists(Path::new("Cargo.toml")).is_err());
        assert!(check_dir_exists(Path::new("no/such/dir")).is_err());
    }
}
