#[macro_use]
extern crate log;

mod client;
mod error;
mod filter;
mod proxy;
mod response;
mod user;

pub use crate::client::{CasClient, TicketValidator, TicketVerification};
pub use crate::error::CasError;
pub use crate::filter::AttributeFilter;
pub use crate::proxy::ProxyGrantingTickets;
pub use crate::response::{parse_proxy_response, parse_service_response, ServiceResponse};
pub use crate::user::CasUser;
