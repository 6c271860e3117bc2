pub mod cors;
pub mod event;
pub mod handlers;
pub mod response;
pub mod router;

pub use cors::OriginPolicy;
pub use event::HttpEvent;
pub use response::HttpResponse;
pub use router::{ApiState, handle};
