//! `POST /convert`: multipart receiver, error mapping and the JSON success body.

mod errors;
mod handlers;
mod multipart;

pub(super) use handlers::convert_upload;
