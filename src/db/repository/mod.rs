pub mod decision;
pub mod intake;

pub use decision::*;
pub use intake::*;

use uuid::Uuid;

use super::DatabaseError;

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    })
}
