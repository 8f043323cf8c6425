//! Override hooks attached to individual objects
//!
//! An object may carry one [`ObjectProxy`]. Every hook has a default, so an
//! implementation only overrides what it needs. Proxies are saved by
//! [`ObjectProxy::type_name`] plus [`ObjectProxy::dump_state`] and rebuilt on
//! open through the [`ProxyFactory`] registered under that name.

use std::sync::Arc;

use crate::exec::{ExecContext, ExecError};
use crate::object::DocumentObject;

/// Capability object installed on a document object
pub trait ObjectProxy: Send + Sync {
    /// Name the proxy factory is registered under
    fn type_name(&self) -> &str;

    /// May `group` accept `candidate` as a member
    fn allow_object(&self, _group: &DocumentObject, _candidate: &DocumentObject) -> bool {
        true
    }

    /// Called before a property of the owner changes
    fn on_before_change(&self, _object: &DocumentObject, _property: &str) {}

    /// Called after a property of the owner changed
    fn on_changed(&self, _object: &DocumentObject, _property: &str) {}

    /// Called once the whole document has been restored
    ///
    /// The only hook allowed to mutate the object directly, used to bring
    /// properties saved under an older schema up to date.
    fn on_document_restored(&self, _object: &mut DocumentObject) {}

    /// Runs after the object's type executor during recompute
    ///
    /// # Errors
    /// A failure marks the owner invalid.
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Result<(), ExecError> {
        Ok(())
    }

    /// State saved alongside the type name
    fn dump_state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Rebuilds a proxy from its saved state
pub type ProxyFactory = Arc<dyn Fn(&serde_json::Value) -> Arc<dyn ObjectProxy> + Send + Sync>;
