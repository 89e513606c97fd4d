// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

/// Prefix shared by all configuration variables.
pub const ENV_PREFIX: &str = "REACT_APP_FIREBASE_";

/// Values captured when the binary was built.
const BUILD_ENV: [(&str, Option<&str>); 7] = [
    ("API_KEY", option_env!("REACT_APP_FIREBASE_API_KEY")),
    ("AUTH_DOMAIN", option_env!("REACT_APP_FIREBASE_AUTH_DOMAIN")),
    ("DATABASE_URL", option_env!("REACT_APP_FIREBASE_DATABASE_URL")),
    ("PROJECT_ID", option_env!("REACT_APP_FIREBASE_PROJECT_ID")),
    ("STORAGE_BUCKET", option_env!("REACT_APP_FIREBASE_STORAGE_BUCKET")),
    (
        "MESSAGING_SENDER_ID",
        option_env!("REACT_APP_FIREBASE_MESSAGING_SENDER_ID"),
    ),
    ("APP_ID", option_env!("REACT_APP_FIREBASE_APP_ID")),
];

/// The Firebase web app configuration.
///
/// Missing values are kept empty. Nothing is validated here, an incomplete configuration
/// simply produces a client whose requests fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl FirebaseConfig {
    /// Reads the configuration from the process environment, falling back to the values
    /// captured at build time.
    pub fn load() -> Self {
        Self::from_lookup(|key| {
            std::env::var(format!("{ENV_PREFIX}{key}"))
                .ok()
                .or_else(|| Self::build_value(key).map(String::from))
        })
    }

    /// Builds the configuration from `lookup`, which is called with each key without the
    /// [`ENV_PREFIX`], e.g. `DATABASE_URL`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        Self {
            api_key: get("API_KEY"),
            auth_domain: get("AUTH_DOMAIN"),
            database_url: get("DATABASE_URL"),
            project_id: get("PROJECT_ID"),
            storage_bucket: get("STORAGE_BUCKET"),
            messaging_sender_id: get("MESSAGING_SENDER_ID"),
            app_id: get("APP_ID"),
        }
    }

    fn build_value(key: &str) -> Option<&'static str> {
        BUILD_ENV
            .iter()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| *value)
    }

    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("API_KEY", self.api_key.as_str()),
            ("AUTH_DOMAIN", self.auth_domain.as_str()),
            ("DATABASE_URL", self.database_url.as_str()),
            ("PROJECT_ID", self.project_id.as_str()),
            ("STORAGE_BUCKET", self.storage_bucket.as_str()),
            ("MESSAGING_SENDER_ID", self.messaging_sender_id.as_str()),
            ("APP_ID", self.app_id.as_str()),
        ]
    }

    /// Full names of the variables that have no value.
    pub fn missing_keys(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| format!("{ENV_PREFIX}{key}"))
            .collect()
    }

    /// True if not a single value is set.
    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, value)| value.is_empty())
    }
}
