//! Read-only lookups: version, auth sources, clusters, nodes, networks,
//! groups, media sources, and VMs.

use serde::{Deserialize, Serialize};

use crate::collection::CollectionQuery;
use crate::error::Result;
use crate::http::HttpTransport;
use crate::query::{Filter, QueryOptions};

pub const VERSION_ENDPOINT: &str = "version.json";
pub const AUTH_SOURCES_ENDPOINT: &str = "auth_sources.json";
pub const CLUSTERS_ENDPOINT: &str = "api/v4/clusters";
pub const NODES_ENDPOINT: &str = "api/v4/nodes";
pub const NETWORKS_ENDPOINT: &str = "api/v4/vnets";
pub const GROUPS_ENDPOINT: &str = "api/v4/groups";
pub const MEDIA_SOURCES_ENDPOINT: &str = "api/v4/files";
pub const VMS_ENDPOINT: &str = "api/v4/vms";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub name: String,
    pub version: String,
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSource {
    #[serde(rename = "$key")]
    pub id: u64,
    pub name: String,
    pub driver: String,
}

/// Entry shape shared by clusters, nodes, and networks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Named {
    #[serde(rename = "$key", alias = "id")]
    pub id: u64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "$key")]
    pub id: u64,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSource {
    #[serde(rename = "$key")]
    pub id: u64,
    pub name: String,
    pub description: String,
    pub filesize: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSummary {
    #[serde(rename = "$key")]
    pub key: u64,
    pub machine: u64,
    pub name: String,
    pub is_snapshot: bool,
}

/// Client-side filter for auth sources; `name` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSourceFilter {
    pub name: Option<String>,
    pub driver: Option<String>,
}

impl AuthSourceFilter {
    fn keeps(&self, source: &AuthSource) -> bool {
        match (&self.name, &self.driver) {
            (Some(name), _) => source.name == *name,
            (None, Some(driver)) => source.driver == *driver,
            (None, None) => true,
        }
    }
}

fn named_query(fields: &str, name: Option<&str>) -> QueryOptions {
    let mut query = QueryOptions::new().fields(fields);
    query.filter = Filter::new().eq_opt("name", name).build();
    query
}

impl<T: HttpTransport> CollectionQuery<'_, T> {
    pub fn version(&self) -> Result<Version> {
        self.client().get_json(VERSION_ENDPOINT, None)
    }

    pub fn auth_sources(&self, filter: &AuthSourceFilter) -> Result<Vec<AuthSource>> {
        self.list_as(AUTH_SOURCES_ENDPOINT, &QueryOptions::new(), |s| filter.keeps(s))
    }

    pub fn clusters(&self, name: Option<&str>) -> Result<Vec<Named>> {
        let query = named_query("$key,name,description", name);
        self.list_as(CLUSTERS_ENDPOINT, &query, |_| true)
    }

    pub fn nodes(&self, name: Option<&str>) -> Result<Vec<Named>> {
        let query = named_query("id,name,description", name);
        self.list_as(NODES_ENDPOINT, &query, |_| true)
    }

    pub fn networks(&self, name: Option<&str>) -> Result<Vec<Named>> {
        let query = named_query("$key,name,description", name);
        self.list_as(NETWORKS_ENDPOINT, &query, |_| true)
    }

    pub fn groups(&self, name: Option<&str>) -> Result<Vec<Group>> {
        let query = named_query("$key,name,description,enabled", name);
        self.list_as(GROUPS_ENDPOINT, &query, |_| true)
    }

    /// Files not owned by any VM, i.e. usable as drive media.
    pub fn media_sources(&self, name: Option<&str>) -> Result<Vec<MediaSource>> {
        let mut query = QueryOptions::new().fields("$key,name,description,filesize");
        query.filter = Filter::new().is_null("owner").eq_opt("name", name).build();
        self.list_as(MEDIA_SOURCES_ENDPOINT, &query, |_| true)
    }

    /// VMs by name; `is_snapshot` is checked client-side.
    pub fn vms(&self, name: Option<&str>, is_snapshot: Option<bool>) -> Result<Vec<VmSummary>> {
        let query = named_query("machine,name,$key,is_snapshot", name);
        self.list_as(VMS_ENDPOINT, &query, |vm: &VmSummary| {
            is_snapshot.map_or(true, |wanted| vm.is_snapshot == wanted)
        })
    }
}
