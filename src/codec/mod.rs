pub mod fields;
pub mod message;
pub mod reader;

pub use fields::{decode_field, decode_fields, decode_vehicle, FieldKind, FieldValue, VehicleRef};
pub use message::{MessageDecoder, Step};
pub use reader::ByteCursor;
