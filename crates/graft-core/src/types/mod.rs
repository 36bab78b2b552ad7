mod ids;

pub use ids::{FieldName, TypeName, GLOBAL_ID_DELIMITER, NAME_MAX_LEN};
