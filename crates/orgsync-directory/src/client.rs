//! LDAP search client.
//!
//! One connection per reconciliation cycle: connect, bind, run the five
//! searches, unbind. Any failure is fatal for the cycle; the next cycle
//! starts from a fresh connection.

use std::time::Duration;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, warn};

use orgsync_config::LdapSettings;

use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{RawDirectory, RawEntry};

/// Directory client bound to one configured LDAP endpoint.
pub struct LdapDirectory {
    settings: LdapSettings,
}

impl LdapDirectory {
    #[must_use]
    pub fn new(settings: LdapSettings) -> Self {
        Self { settings }
    }

    /// Run all configured searches and return the raw result sets.
    pub async fn fetch(&self) -> DirectoryResult<RawDirectory> {
        let mut ldap = self.connect().await?;

        let result = self.fetch_with(&mut ldap).await;

        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "Error during LDAP unbind");
        }

        result
    }

    async fn fetch_with(&self, ldap: &mut Ldap) -> DirectoryResult<RawDirectory> {
        let s = &self.settings;

        let groups = self
            .search(ldap, &s.group_search_base, &s.group_filter)
            .await?;
        info!(count = groups.len(), "Found groups in directory");

        let subgroups = self
            .search(ldap, &s.subgroup_search_base, &s.subgroup_filter)
            .await?;
        info!(count = subgroups.len(), "Found subgroups in directory");

        let users = self
            .search(ldap, &s.user_search_base, &s.user_filter)
            .await?;
        info!(count = users.len(), "Found users in directory");

        let admins = if s.admin_filter.is_empty() {
            Vec::new()
        } else {
            let entries = self
                .search(ldap, &s.user_search_base, &s.admin_filter)
                .await?;
            info!(count = entries.len(), "Found admin users in directory");
            entries
        };

        let restricted = if s.restricted_filter.is_empty() {
            Vec::new()
        } else {
            let entries = self
                .search(ldap, &s.user_search_base, &s.restricted_filter)
                .await?;
            info!(count = entries.len(), "Found restricted users in directory");
            entries
        };

        Ok(RawDirectory {
            groups,
            subgroups,
            users,
            admins,
            restricted,
        })
    }

    async fn connect(&self) -> DirectoryResult<Ldap> {
        let s = &self.settings;
        let url = if s.use_tls {
            format!("ldaps://{}:{}", s.url, s.port)
        } else {
            format!("ldap://{}:{}", s.url, s.port)
        };

        debug!(url = %url, "Connecting to directory server");

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(s.client_timeout_secs))
            .set_no_tls_verify(s.allow_insecure_tls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|source| DirectoryError::Connect {
                url: url.clone(),
                source,
            })?;

        // Drive the connection until it closes.
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        debug!(bind_dn = %s.bind_dn, "Performing LDAP bind");

        // An empty bind DN means an anonymous bind.
        ldap.simple_bind(&s.bind_dn, &s.bind_password)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|source| DirectoryError::Bind {
                bind_dn: s.bind_dn.clone(),
                source,
            })?;

        info!(url = %url, "Directory connection established");

        Ok(ldap)
    }

    async fn search(
        &self,
        ldap: &mut Ldap,
        base: &str,
        filter: &str,
    ) -> DirectoryResult<Vec<RawEntry>> {
        debug!(base = %base, filter = %filter, "Searching directory");

        let map_err = |source| DirectoryError::Search {
            base: base.to_string(),
            filter: filter.to_string(),
            source,
        };

        let (entries, _res) = ldap
            .with_timeout(Duration::from_secs(self.settings.client_timeout_secs))
            .search(base, Scope::Subtree, filter, vec!["*"])
            .await
            .map_err(map_err)?
            .success()
            .map_err(map_err)?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| RawEntry {
                dn: entry.dn,
                attributes: entry.attrs.into_iter().collect(),
            })
            .collect())
    }
}
