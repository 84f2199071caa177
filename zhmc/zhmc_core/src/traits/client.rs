//! The HMC client interface.
//!
//! All HMC I/O of the modules goes through `HmcClient`. The REST protocol,
//! session handling and retries belong to the implementation; the modules
//! only see resources, properties and operations.

use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::types::{Filter, Operation, Properties, Resource, ResourceClass};

/// URI of the HMC console object.
pub const CONSOLE_URI: &str = "/api/console";

/// Receiver for operating system messages of a partition.
pub trait OsMessageReceiver: Send {
    /// Wait for the next batch of OS message texts.
    ///
    /// # Returns
    ///
    /// `Ok(Some(texts))` when messages arrived, `Ok(None)` when the timeout
    /// expired, or a `ChannelClosed` error when the channel was closed.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<String>>>;

    /// Close the channel. Pending and later `receive` calls fail.
    fn close(&mut self);
}

/// An HMC client.
pub trait HmcClient: Send + Sync {
    /// Query the HMC API version (`api-major-version`, `hmc-version`, ...).
    fn query_api_version(&self) -> Result<Properties>;

    /// List the resources of a class below a parent that match a filter.
    ///
    /// `parent` is `None` for top-level resources (CPCs, the console).
    fn list(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        filter: &Filter,
    ) -> Result<Vec<Resource>>;

    /// Get a resource with its full set of properties.
    fn get(&self, uri: &str) -> Result<Resource>;

    /// Create a resource and return it with its full set of properties.
    fn create(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        props: &Properties,
    ) -> Result<Resource>;

    /// Update properties of a resource.
    fn update(&self, uri: &str, props: &Properties) -> Result<()>;

    /// Delete a resource.
    fn delete(&self, uri: &str) -> Result<()>;

    /// Perform an operation on a resource and wait for its completion.
    fn invoke(&self, uri: &str, operation: &Operation) -> Result<()>;

    /// Wait until the `status` property of a resource has one of the given
    /// values, and return that value.
    fn wait_for_status(
        &self,
        uri: &str,
        statuses: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String>;

    /// Open the OS message channel of a partition or LPAR.
    fn open_os_message_channel(&self, uri: &str) -> Result<Box<dyn OsMessageReceiver>>;

    /// Log off from the HMC.
    fn logoff(&self) -> Result<()>;

    /// Find the single resource of a class with the given name.
    fn find(&self, class: ResourceClass, parent: Option<&str>, name: &str) -> Result<Resource> {
        self.find_by(class, parent, &Filter::by_name(name))
    }

    /// Find the single resource of a class matching a filter.
    fn find_by(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        filter: &Filter,
    ) -> Result<Resource> {
        let mut found = self.list(class, parent, filter)?;
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(ClientError::NotFound {
                class: class.to_string(),
                filter: filter.to_string(),
            }
            .into()),
            _ => Err(ClientError::NoUniqueMatch {
                class: class.to_string(),
                filter: filter.to_string(),
            }
            .into()),
        }
    }

    /// Find the resource of a class with the given name, if it exists.
    fn find_optional(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        name: &str,
    ) -> Result<Option<Resource>> {
        match self.find(class, parent, name) {
            Ok(resource) => Ok(Some(resource)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Re-read the properties of a resource into the local view.
    fn pull_properties(&self, resource: &mut Resource) -> Result<()> {
        resource.properties = self.get(&resource.uri)?.properties;
        Ok(())
    }

    /// The HMC console resource.
    fn console(&self) -> Result<Resource> {
        self.get(CONSOLE_URI)
    }
}
