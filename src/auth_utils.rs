// auth_utils.rs
use crate::errors::CredentialError;
use google_sheets4::hyper::client::HttpConnector;
use google_sheets4::hyper_rustls::HttpsConnector;
use log::debug;
use std::fs::File;
use std::io::Read;
use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// The token authenticator handed to the Sheets hub.
pub type SheetsAuthenticator = Authenticator<HttpsConnector<HttpConnector>>;

/// Loads a Google Cloud service account key from a local JSON file.
///
/// The key authorizes automated access to Google Sheets documents that have
/// been shared with the service account's email address. Store the key file
/// outside the repository; anyone holding it can act as the account.
///
/// ```
/// use dbsheets::auth_utils::load_service_account_key;
///
/// match load_service_account_key("db-to-gsheets-demo.json") {
///     Ok(key) => println!("acting as {}", key.client_email),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load_service_account_key(path: &str) -> Result<ServiceAccountKey, CredentialError> {
    let mut json = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut json))
        .map_err(|e| CredentialError::Missing {
            path: path.to_string(),
            source: e,
        })?;

    let key: ServiceAccountKey =
        serde_json::from_str(&json).map_err(|e| CredentialError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(key_type) = &key.key_type {
        if key_type != "service_account" {
            return Err(CredentialError::Malformed {
                path: path.to_string(),
                reason: format!("expected a service_account key, got '{}'", key_type),
            });
        }
    }

    if key.client_email.is_empty() || key.private_key.is_empty() {
        return Err(CredentialError::Malformed {
            path: path.to_string(),
            reason: "client_email and private_key must both be present".to_string(),
        });
    }

    debug!("loaded service account key for {}", key.client_email);

    Ok(key)
}

/// Builds the token authenticator for the given service account key. The
/// Sheets scope itself is requested lazily, per API call, by the hub.
pub async fn build_service_account_auth(
    key: ServiceAccountKey,
) -> Result<SheetsAuthenticator, CredentialError> {
    ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| CredentialError::Rejected(e.to_string()))
}
