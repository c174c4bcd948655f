// Captured Premaster secrets - one hex string per line

use crate::error::DrownError;
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse captured secrets, skipping blank lines and `#` comments.
///
/// The returned order is the Premaster secret index used by the attack, so
/// index `i` is the `i`-th parsed secret (0-based), not the `i`-th file line.
/// Line numbers only appear in parse errors.
pub fn parse_premaster_secrets(content: &str) -> Result<Vec<Vec<u8>>> {
    let mut secrets = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let hex_str = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line);
        let secret = hex::decode(hex_str).map_err(|e| DrownError::ParseError {
            message: format!("line {}: invalid hex Premaster secret: {}", number + 1, e),
        })?;
        secrets.push(secret);
    }

    Ok(secrets)
}

/// Load captured secrets from a file.
///
/// Indices into the result (`pms_index`, "Premaster secret #N" in the logs)
/// count parsed secrets only; blank and `#` lines do not shift them.
pub fn load_premaster_secrets(path: &Path) -> Result<Vec<Vec<u8>>> {
    let content = fs::read_to_string(path).map_err(|source| DrownError::FileSystemError {
        path: path.display().to_string(),
        source,
    })?;

    let secrets = parse_premaster_secrets(&content)?;
    if secrets.is_empty() {
        return Err(DrownError::ConfigError {
            message: format!("No Premaster secrets found in {}", path.display()),
        });
    }

    debug!("Loaded {} Premaster secrets from {}", secrets.len(), path.display());
    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_lines() {
        let secrets = parse_premaster_secrets("00ff\n\n# comment\n  0xABCD  \n").unwrap();
        assert_eq!(secrets, vec![vec![0x00, 0xFF], vec![0xAB, 0xCD]]);
    }

    #[test]
    fn test_index_ignores_skipped_lines() {
        let content = "# captured 2016-03-01\n\n0a0b\n# retry\n\n0c0d\n0e0f\n";
        let secrets = parse_premaster_secrets(content).unwrap();
        assert_eq!(secrets.len(), 3);
        assert_eq!(secrets[0], vec![0x0A, 0x0B]);
        assert_eq!(secrets[1], vec![0x0C, 0x0D]);
        assert_eq!(secrets[2], vec![0x0E, 0x0F]);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_premaster_secrets("0011\nzz\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_empty_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let err = load_premaster_secrets(file.path()).unwrap_err();
        assert!(matches!(err, DrownError::ConfigError { .. }));
    }
}
