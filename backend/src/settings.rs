//! Synchronisation settings loaded via OrthoConfig.
//!
//! Values come from `ENVSYNC_*` environment variables or a configuration
//! file; command-line flags of the binary take precedence over both.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_MAP_FORMAT_ID, SyncOptions};
use crate::outbound::persistence::PoolConfig;

/// Configuration values for the `sync-environment` binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ENVSYNC")]
pub struct SyncSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Rendering format assigned to maps created during synchronisation.
    #[ortho_config(default = 1)]
    pub map_format_id: i64,
    /// Maximum number of pooled database connections.
    pub pool_size: Option<u32>,
    /// Store detected POI/zone containment links. Unset means enabled.
    pub persist_links: Option<bool>,
}

impl SyncSettings {
    /// Map format to use, falling back to the default when the configured
    /// value cannot name a format.
    pub fn map_format_id(&self) -> i64 {
        if self.map_format_id > 0 {
            self.map_format_id
        } else {
            DEFAULT_MAP_FORMAT_ID
        }
    }

    /// Whether containment links are stored, defaulting to `true`.
    pub fn persist_links(&self) -> bool {
        self.persist_links.unwrap_or(true)
    }

    /// Options handed to the synchronisation service.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            map_format_id: self.map_format_id(),
            persist_links: self.persist_links(),
        }
    }

    /// Pool configuration for `database_url`, honouring `pool_size`.
    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        let config = PoolConfig::new(database_url);
        match self.pool_size {
            Some(size) => config.with_max_size(size),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> SyncSettings {
        SyncSettings::load_from_iter([OsString::from("sync-environment")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env([
            ("ENVSYNC_DATABASE_URL", None::<String>),
            ("ENVSYNC_MAP_FORMAT_ID", None::<String>),
            ("ENVSYNC_POOL_SIZE", None::<String>),
            ("ENVSYNC_PERSIST_LINKS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.database_url.is_none());
        assert!(settings.persist_links());
        assert_eq!(settings.sync_options(), SyncOptions::default());
        assert_eq!(
            settings.pool_config("postgres://localhost/envsync").max_size(),
            PoolConfig::DEFAULT_MAX_SIZE
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "ENVSYNC_DATABASE_URL",
                Some("postgres://sync@db/envsync".to_owned()),
            ),
            ("ENVSYNC_MAP_FORMAT_ID", Some("4".to_owned())),
            ("ENVSYNC_POOL_SIZE", Some("2".to_owned())),
            ("ENVSYNC_PERSIST_LINKS", Some("false".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://sync@db/envsync")
        );
        assert_eq!(
            settings.sync_options(),
            SyncOptions {
                map_format_id: 4,
                persist_links: false,
            }
        );
        assert_eq!(settings.pool_config("postgres://db").max_size(), 2);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn unusable_map_formats_fall_back(#[case] configured: i64) {
        let settings = SyncSettings {
            database_url: None,
            map_format_id: configured,
            pool_size: None,
            persist_links: None,
        };
        assert_eq!(settings.map_format_id(), DEFAULT_MAP_FORMAT_ID);
    }
}
