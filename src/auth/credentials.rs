//! Credential management for the Data Stores API
//!
//! Credentials are an API URL and a personal access key. They are read from
//! the `ECMWF_DATASTORES_URL` / `ECMWF_DATASTORES_KEY` environment variables
//! (which `main` also loads from a `.env` file), falling back to the
//! `~/.ecmwfdatastoresrc` file with `url:` and `key:` lines.

use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use url::Url;

use crate::app::client::{ClientConfig, DataStoresClient};
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// API location and access key
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &mask_key(&self.key))
            .finish()
    }
}

impl Credentials {
    /// Load credentials from the environment, then the rc file
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` when no key is configured
    pub fn load() -> AuthResult<Self> {
        let rc_path = rc_file_path();
        Self::resolve(
            env::var(env_constants::URL).ok(),
            env::var(env_constants::KEY).ok(),
            rc_path.as_deref(),
        )
    }

    /// Combine environment values with the rc file at `rc_path`.
    ///
    /// Environment values win field by field; the URL defaults to the public
    /// Climate Data Store API.
    pub fn resolve(
        env_url: Option<String>,
        env_key: Option<String>,
        rc_path: Option<&Path>,
    ) -> AuthResult<Self> {
        let (rc_url, rc_key) = match rc_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                parse_rc(path, &content)?
            }
            _ => (None, None),
        };

        let key = non_empty(env_key)
            .or(rc_key)
            .ok_or(AuthError::MissingCredentials)?;
        let url = non_empty(env_url)
            .or(rc_url)
            .unwrap_or_else(|| auth::DEFAULT_API_URL.to_string());

        validate_url(&url)?;
        Ok(Self { url, key })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Location of the rc file in the home directory
pub fn rc_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(auth::RC_FILE_NAME))
}

/// Parse `url: ...` and `key: ...` lines.
///
/// Blank lines and `#` comments are skipped, other keys are ignored.
pub fn parse_rc(path: &Path, content: &str) -> AuthResult<(Option<String>, Option<String>)> {
    let mut url = None;
    let mut key = None;

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, value) =
            line.split_once(':')
                .ok_or_else(|| AuthError::MalformedCredentialsFile {
                    path: path.to_path_buf(),
                    reason: format!("line {} is not a 'name: value' pair", number + 1),
                })?;
        let value = value.trim().to_string();
        match name.trim() {
            "url" => url = Some(value).filter(|v| !v.is_empty()),
            "key" => key = Some(value).filter(|v| !v.is_empty()),
            other => tracing::debug!("Ignoring '{}' in {}", other, path.display()),
        }
    }

    Ok((url, key))
}

fn validate_url(url: &str) -> AuthResult<()> {
    let parsed = Url::parse(url).map_err(|e| AuthError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AuthError::InvalidUrl {
            url: url.to_string(),
            error: "scheme must be http or https".to_string(),
        });
    }
    Ok(())
}

/// Validate the shape of an access key
fn validate_key(key: &str) -> AuthResult<()> {
    if key.len() < auth::MIN_KEY_LENGTH {
        return Err(AuthError::InvalidKey {
            reason: format!("key must be at least {} characters", auth::MIN_KEY_LENGTH),
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidKey {
            reason: "key cannot contain whitespace".to_string(),
        });
    }
    Ok(())
}

/// Show only the start of a key
fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the URL environment variable is set
    pub url_set: bool,
    /// Whether the key environment variable is set
    pub key_set: bool,
    /// Whether the rc file exists in the home directory
    pub rc_file_exists: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Whether credentials have been verified (None = not tested)
    pub credentials_valid: Option<bool>,
}

impl AuthStatus {
    /// Check if a key is available from any source
    pub fn has_credentials(&self) -> bool {
        self.key_set || self.rc_file_exists
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), self.credentials_valid) {
            (false, _) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, None) => "Credentials configured but not verified".to_string(),
            (true, Some(true)) => "Credentials configured and verified".to_string(),
            (true, Some(false)) => "Credentials configured but invalid".to_string(),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        url_set: env::var(env_constants::URL).is_ok(),
        key_set: env::var(env_constants::KEY).is_ok(),
        rc_file_exists: rc_file_path().is_some_and(|p| p.exists()),
        dotenv_file_exists: Path::new(".env").exists(),
        credentials_valid: None,
    }
}

/// Check if usable credentials exist
pub fn check_credentials() -> bool {
    Credentials::load().is_ok()
}

/// Prompt user for credentials interactively
pub fn prompt_credentials() -> AuthResult<Credentials> {
    print!("API URL [{}]: ", auth::DEFAULT_API_URL);
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut url = String::new();
    io::stdin()
        .read_line(&mut url)
        .map_err(AuthError::CredentialStorage)?;
    let url = match url.trim() {
        "" => auth::DEFAULT_API_URL.to_string(),
        entered => entered.to_string(),
    };
    validate_url(&url)?;

    let key = rpassword::prompt_password("API key: ")
        .map_err(|e| AuthError::CredentialStorage(io::Error::new(io::ErrorKind::Other, e)))?;
    let key = key.trim().to_string();
    validate_key(&key)?;

    Ok(Credentials { url, key })
}

/// Save credentials to the .env file in the current directory
pub fn save_credentials(credentials: &Credentials) -> AuthResult<()> {
    save_credentials_to(Path::new(".env"), credentials)?;

    // Make them visible to the rest of this process
    env::set_var(env_constants::URL, &credentials.url);
    env::set_var(env_constants::KEY, &credentials.key);

    println!("Credentials saved to .env file");

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    #[cfg(not(unix))]
    println!(
        "Warning: File permissions not set (non-Unix system). Please ensure .env file is protected."
    );

    Ok(())
}

/// Write credentials into the env file at `env_path`, keeping other lines
pub fn save_credentials_to(env_path: &Path, credentials: &Credentials) -> AuthResult<()> {
    let url_line = format!("{}={}", env_constants::URL, credentials.url);
    let key_line = format!("{}={}", env_constants::KEY, credentials.key);
    let mut lines = Vec::new();
    let mut url_found = false;
    let mut key_found = false;

    if env_path.exists() {
        let reader = BufReader::new(File::open(env_path)?);
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with(&format!("{}=", env_constants::URL)) {
                lines.push(url_line.clone());
                url_found = true;
            } else if trimmed.starts_with(&format!("{}=", env_constants::KEY)) {
                lines.push(key_line.clone());
                key_found = true;
            } else {
                lines.push(line);
            }
        }
    }

    if !url_found {
        lines.push(url_line);
    }
    if !key_found {
        lines.push(key_line);
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Verify the configured credentials against the API
pub async fn verify_credentials(config: &ClientConfig) -> AuthResult<bool> {
    let credentials = Credentials::load()?;

    println!("Verifying access key with {}...", credentials.url);

    match DataStoresClient::new(&credentials, config.clone()).await {
        Ok(_) => {
            println!("Credentials verified successfully!");
            Ok(true)
        }
        Err(e) => {
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive credential setup workflow
pub async fn setup_credentials(config: &ClientConfig, force: bool) -> AuthResult<()> {
    println!("ECMWF Data Stores Authentication Setup");
    println!("======================================");
    println!();
    println!("Your API key is shown on your profile page of the Climate Data Store.");
    println!("It will be stored in a .env file in the current directory.");
    println!();

    if !force && get_auth_status().has_credentials() {
        println!("Warning: Credentials are already configured.");
        if !confirm("Do you want to update them? [y/N]: ", false)? {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let credentials = prompt_credentials()?;

    println!();
    println!("Saving credentials...");
    save_credentials(&credentials)?;

    println!();
    if verify_credentials(config).await? {
        println!();
        println!("Setup complete! You can now submit and download jobs.");
    } else {
        println!();
        println!("Setup failed. Please check your key and try again.");
        println!("   You can run 'auth setup' again to re-enter your credentials.");
    }

    Ok(())
}

/// Show current authentication status
pub async fn show_auth_status(config: &ClientConfig) -> AuthResult<()> {
    let mut status = get_auth_status();

    println!("ECMWF Data Stores Authentication Status");
    println!("=======================================");
    println!();

    match env::var(env_constants::URL) {
        Ok(url) => println!("API URL: {} (set)", url),
        Err(_) => println!("API URL: Not set (default {})", auth::DEFAULT_API_URL),
    }
    match env::var(env_constants::KEY) {
        Ok(key) => println!("API key: {} (set)", mask_key(&key)),
        Err(_) => println!("API key: Not set"),
    }
    println!(
        "{}: {}",
        auth::RC_FILE_NAME,
        if status.rc_file_exists { "Exists" } else { "Not found" }
    );
    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );
    println!();

    if status.has_credentials() {
        println!("Testing credentials...");
        status.credentials_valid = Some(verify_credentials(config).await.unwrap_or(false));
        println!();
    }

    println!("Status: {}", status.status_message());

    if !status.has_credentials() {
        println!();
        println!("To configure credentials, run: era5_fetcher auth setup");
    } else if status.credentials_valid == Some(false) {
        println!();
        println!("To update credentials, run: era5_fetcher auth setup");
    }

    Ok(())
}

/// Load credentials, offering interactive setup when none are configured
pub async fn ensure_authenticated(config: &ClientConfig) -> AuthResult<Credentials> {
    match Credentials::load() {
        Ok(credentials) => Ok(credentials),
        Err(AuthError::MissingCredentials) => {
            println!("This command requires an ECMWF Data Stores API key.");
            println!();

            if !confirm("Would you like to set up authentication now? [Y/n]: ", true)? {
                return Err(AuthError::MissingCredentials);
            }

            println!();
            setup_credentials(config, true).await?;
            Credentials::load()
        }
        Err(e) => Err(e),
    }
}

fn confirm(prompt: &str, default: bool) -> AuthResult<bool> {
    print!("{}", prompt);
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .map_err(AuthError::CredentialStorage)?;

    Ok(match response.trim().to_lowercase().chars().next() {
        Some('y') => true,
        Some('n') => false,
        _ => default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_environment() {
        let dir = TempDir::new().unwrap();
        let rc = dir.path().join(".ecmwfdatastoresrc");
        std::fs::write(&rc, "url: https://rc.example.org/api\nkey: rc-key-12345\n").unwrap();

        let creds = Credentials::resolve(
            Some("https://env.example.org/api".to_string()),
            Some("env-key-12345".to_string()),
            Some(&rc),
        )
        .unwrap();
        assert_eq!(creds.url, "https://env.example.org/api");
        assert_eq!(creds.key, "env-key-12345");
    }

    #[test]
    fn test_resolve_falls_back_to_rc_file() {
        let dir = TempDir::new().unwrap();
        let rc = dir.path().join(".ecmwfdatastoresrc");
        std::fs::write(&rc, "# personal token\nurl: https://rc.example.org/api\nkey: rc-key-12345\n")
            .unwrap();

        let creds = Credentials::resolve(None, Some("  ".to_string()), Some(&rc)).unwrap();
        assert_eq!(creds.url, "https://rc.example.org/api");
        assert_eq!(creds.key, "rc-key-12345");
    }

    #[test]
    fn test_resolve_default_url_and_missing_key() {
        let creds = Credentials::resolve(None, Some("env-key-12345".to_string()), None).unwrap();
        assert_eq!(creds.url, auth::DEFAULT_API_URL);

        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("missing");
        let err = Credentials::resolve(None, None, Some(&absent)).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[test]
    fn test_resolve_rejects_bad_url() {
        let err = Credentials::resolve(
            Some("ftp://example.org".to_string()),
            Some("env-key-12345".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidUrl { .. }));
    }

    #[test]
    fn test_parse_rc_malformed_line() {
        let err = parse_rc(Path::new("rc"), "url https://x\n").unwrap_err();
        match err {
            AuthError::MalformedCredentialsFile { reason, .. } => assert!(reason.contains("line 1")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_rc_keeps_colons_in_values() {
        let (url, key) = parse_rc(Path::new("rc"), "url: https://host:8443/api\nverify: 1\n").unwrap();
        assert_eq!(url.as_deref(), Some("https://host:8443/api"));
        assert_eq!(key, None);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("abcd-1234-efgh").is_ok());
        assert!(validate_key("short").is_err());
        assert!(validate_key("has white space").is_err());
    }

    #[test]
    fn test_debug_masks_key() {
        let creds = Credentials {
            url: "https://example.org/api".to_string(),
            key: "secret-value-123".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("secr****"));
        assert!(!debug.contains("secret-value-123"));
    }

    #[test]
    fn test_auth_status_messages() {
        let mut status = AuthStatus {
            url_set: false,
            key_set: false,
            rc_file_exists: false,
            dotenv_file_exists: false,
            credentials_valid: None,
        };
        assert!(status.status_message().contains("Missing credentials"));

        status.key_set = true;
        assert!(status.status_message().contains("not verified"));

        status.credentials_valid = Some(true);
        assert!(status.status_message().contains("verified"));

        status.credentials_valid = Some(false);
        assert!(status.status_message().contains("invalid"));
    }

    #[test]
    fn test_save_credentials_replaces_existing_lines() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let env_path = temp_dir.path().join(".env");
        std::fs::write(
            &env_path,
            "RUST_LOG=debug\nECMWF_DATASTORES_KEY=old-key-0000\n",
        )?;

        let creds = Credentials {
            url: "https://cds.climate.copernicus.eu/api".to_string(),
            key: "new-key-12345".to_string(),
        };
        save_credentials_to(&env_path, &creds)?;

        let contents = std::fs::read_to_string(&env_path)?;
        assert!(contents.contains("RUST_LOG=debug"));
        assert!(contents.contains("ECMWF_DATASTORES_KEY=new-key-12345"));
        assert!(!contents.contains("old-key-0000"));
        assert!(contents.contains("ECMWF_DATASTORES_URL=https://cds.climate.copernicus.eu/api"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::metadata(&env_path)?.permissions();
            assert_eq!(permissions.mode() & 0o777, 0o600);
        }

        Ok(())
    }
}
