//! Crownpeak DQM CMS API: operations, request construction and dispatch.
//!
//! The flow for each input item is
//! [`ParameterReader`] → [`DqmRequest`] → [`build_request`] →
//! [`HttpTransport`], driven in order by the [`Dispatcher`].

mod builder;
mod credentials;
mod dispatcher;
mod operation;
mod parameters;
mod request;
mod transport;

pub use builder::{
    build, build_request, build_with_config, RequestDescriptor, API_KEY_HEADER, FORM_CONTENT_TYPE,
};
pub use credentials::{
    ContextCredentials, CredentialProvider, DqmCredentials, StaticCredentials, DEFAULT_BASE_URL,
};
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use operation::{HttpMethod, Operation};
pub use parameters::{NodeParameters, ParameterReader};
pub use request::{DqmCall, DqmRequest};
pub use transport::{HttpTransport, ReqwestTransport};
