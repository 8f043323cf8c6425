use thiserror::Error;

use crate::types::ObjectId;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("object {0} is not part of the graph")]
    NodeNotFound(ObjectId),

    #[error("dependency cycle through {} object(s)", .0.len())]
    CycleDetected(Vec<ObjectId>),
}
