//! Shared library providing the two dynamic example modules.

use std::sync::Arc;

use modhost::app::keys::{EXAMPLE_OBJECT_1, EXAMPLE_OBJECT_2};
use modhost::export_objects;
use modhost::modules::ExampleModule;
use modhost::{HostError, Result, SharedObject};

fn create_object(object_id: &str) -> Result<SharedObject> {
    match object_id {
        EXAMPLE_OBJECT_1 | EXAMPLE_OBJECT_2 => {
            tracing::debug!(object_id, "Creating example module");
            Ok(Arc::new(ExampleModule::new(object_id)))
        }
        other => Err(HostError::NotFound(other.to_string())),
    }
}

export_objects!(create_object);
